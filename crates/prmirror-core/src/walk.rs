//! Tree walk policy.
//!
//! Decides which entries below the head commit's root tree are mirrored.
//! Depth 1 is the root tree's own entries. An entry is selected when it is
//! within `max_depth` and either the allow-list is empty, the entry is listed,
//! it is an ancestor of a listed path, or it lies inside a listed directory.
//!
//! A listed path written with a trailing `/` must be a directory. Ancestors of
//! listed paths must be directories too, and the output must be a file.

use serde::Deserialize;

use crate::error::{MirrorError, MirrorResult};
use crate::model::TreeEntryKind;

/// Default designated subdirectory.
pub const DEFAULT_SUBTREE: &str = "packages";

/// Default designated ignore-file, also the default output blob.
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WalkPolicy {
    pub max_depth: usize,
    pub paths: Vec<String>,
    /// Blob whose decoded content is the run's output.
    pub output: Option<String>,
    /// Listed paths that must be trees; filled by [`WalkPolicy::validate`].
    #[serde(skip)]
    pub directories: Vec<String>,
}

impl Default for WalkPolicy {
    fn default() -> Self {
        Self {
            max_depth: 1,
            paths: vec![format!("{}/", DEFAULT_SUBTREE), DEFAULT_IGNORE_FILE.to_string()],
            output: Some(DEFAULT_IGNORE_FILE.to_string()),
            directories: Vec::new(),
        }
    }
}

impl WalkPolicy {
    /// Normalize listed paths and check the policy is walkable.
    pub fn validate(mut self) -> MirrorResult<Self> {
        if self.max_depth == 0 {
            return Err(MirrorError::configuration("walk.max_depth must be at least 1"));
        }

        let mut directories: Vec<String> = Vec::new();
        for path in &self.directories {
            push_unique(&mut directories, normalize(path)?);
        }

        let mut paths: Vec<String> = Vec::with_capacity(self.paths.len());
        for raw in &self.paths {
            let path = normalize(raw)?;
            if raw.trim().ends_with('/') {
                push_unique(&mut directories, path.clone());
            }
            push_unique(&mut paths, path);
        }
        self.paths = paths;
        self.directories = directories;

        if let Some(output) = self.output.take() {
            let output = normalize(&output)?;
            if !self.selects(&output, depth_of(&output)) {
                return Err(MirrorError::configuration(format!(
                    "walk.output '{}' is outside the walked paths",
                    output
                )));
            }
            if self.must_be_tree(&output) {
                return Err(MirrorError::configuration(format!(
                    "walk.output '{}' is listed as a directory",
                    output
                )));
            }
            self.output = Some(output);
        }

        Ok(self)
    }

    /// Whether the entry at `path` (at `depth`) should be mirrored.
    pub fn selects(&self, path: &str, depth: usize) -> bool {
        if depth > self.max_depth {
            return false;
        }
        if self.paths.is_empty() {
            return true;
        }
        self.paths.iter().any(|listed| {
            listed == path || is_inside(listed, path) || is_inside(path, listed)
        })
    }

    /// A listed path within reach lies below `path`, so it has to be a tree.
    pub fn expects_directory(&self, path: &str) -> bool {
        self.paths
            .iter()
            .any(|listed| is_inside(path, listed) && depth_of(listed) <= self.max_depth)
    }

    /// Check a selected entry against the kind the policy needs at `path`.
    ///
    /// Submodules are skipped unless the policy names them, in which case the
    /// listed path cannot be mirrored and the entry is rejected.
    pub fn check_entry(&self, path: &str, kind: TreeEntryKind) -> MirrorResult<()> {
        let wanted = match self.expected_kind(path) {
            Some(expected) if expected == kind => return Ok(()),
            Some(TreeEntryKind::Tree) => "directory",
            Some(_) => "file",
            None if kind == TreeEntryKind::Commit && self.paths.iter().any(|p| p == path) => "listed path",
            None => return Ok(()),
        };
        let found = match kind {
            TreeEntryKind::Blob => "a file",
            TreeEntryKind::Tree => "a directory",
            TreeEntryKind::Commit => "a submodule",
        };
        Err(MirrorError::not_found(format!("{} '{}' (found {})", wanted, path, found)))
    }

    /// Kind the entry at `path` must have, when the policy constrains it.
    pub fn expected_kind(&self, path: &str) -> Option<TreeEntryKind> {
        if self.must_be_tree(path) {
            Some(TreeEntryKind::Tree)
        } else if self.output.as_deref() == Some(path) {
            Some(TreeEntryKind::Blob)
        } else {
            None
        }
    }

    fn must_be_tree(&self, path: &str) -> bool {
        self.directories.iter().any(|d| d == path) || self.expects_directory(path)
    }

    /// Path segments that must exist in the tree at `parent` ("" for the root).
    pub fn required_in(&self, parent: &str) -> Vec<&str> {
        let child_depth = if parent.is_empty() { 1 } else { depth_of(parent) + 1 };
        if child_depth > self.max_depth {
            return Vec::new();
        }

        let mut required: Vec<&str> = Vec::new();
        for listed in &self.paths {
            let rest = if parent.is_empty() {
                Some(listed.as_str())
            } else {
                listed
                    .strip_prefix(parent)
                    .and_then(|r| r.strip_prefix('/'))
            };
            if let Some(segment) = rest.and_then(|r| r.split('/').next()) {
                if !required.contains(&segment) {
                    required.push(segment);
                }
            }
        }
        required
    }
}

/// Join a parent path and an entry segment.
pub fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", parent, segment)
    }
}

/// Number of segments in a normalized path.
pub fn depth_of(path: &str) -> usize {
    path.split('/').count()
}

/// `inner` lies strictly below directory `outer`.
fn is_inside(outer: &str, inner: &str) -> bool {
    inner
        .strip_prefix(outer)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn normalize(path: &str) -> MirrorResult<String> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(MirrorError::configuration("walk paths must not be empty"));
    }
    if trimmed.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
        return Err(MirrorError::configuration(format!(
            "walk path '{}' must be a plain relative path",
            path
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_depth: usize, paths: &[&str]) -> WalkPolicy {
        WalkPolicy {
            max_depth,
            paths: paths.iter().map(|p| p.to_string()).collect(),
            output: None,
            directories: Vec::new(),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_default_is_single_level() {
        let p = WalkPolicy::default().validate().unwrap();
        assert!(p.selects("packages", 1));
        assert!(p.selects(".gitignore", 1));
        assert!(!p.selects("README.md", 1));
        assert!(!p.selects("packages/core", 2));
        assert_eq!(p.required_in(""), vec!["packages", ".gitignore"]);
        assert!(p.required_in("packages").is_empty());
        assert_eq!(p.paths, vec!["packages".to_string(), ".gitignore".to_string()]);
        assert_eq!(p.directories, vec!["packages".to_string()]);
    }

    #[test]
    fn test_entry_kinds_checked() {
        let p = WalkPolicy::default().validate().unwrap();
        assert!(p.check_entry("packages", TreeEntryKind::Tree).is_ok());
        assert!(p.check_entry(".gitignore", TreeEntryKind::Blob).is_ok());

        let err = p.check_entry("packages", TreeEntryKind::Blob).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("directory 'packages' (found a file)"), "{err}");

        assert!(p.check_entry(".gitignore", TreeEntryKind::Tree).unwrap_err().is_not_found());
        assert!(p.check_entry("packages", TreeEntryKind::Commit).unwrap_err().is_not_found());
    }

    #[test]
    fn test_listed_submodule_rejected() {
        let p = policy(1, &["vendor", "README.md"]);
        assert_eq!(p.expected_kind("vendor"), None);
        let err = p.check_entry("vendor", TreeEntryKind::Commit).unwrap_err();
        assert!(err.to_string().contains("listed path 'vendor' (found a submodule)"), "{err}");

        // Plain listed paths may be either kind.
        assert!(p.check_entry("README.md", TreeEntryKind::Blob).is_ok());
        assert!(p.check_entry("vendor", TreeEntryKind::Tree).is_ok());
    }

    #[test]
    fn test_unlisted_submodule_skipped_quietly() {
        let p = policy(2, &[]);
        assert!(p.check_entry("vendor", TreeEntryKind::Commit).is_ok());
    }

    #[test]
    fn test_ancestors_and_descendants_selected() {
        let p = policy(3, &["server/src"]);
        assert!(p.selects("server", 1));
        assert!(p.selects("server/src", 2));
        assert!(p.selects("server/src/main.rs", 3));
        assert!(!p.selects("server/tests", 2));
        assert!(!p.selects("server/src/a/b.rs", 4));
        assert_eq!(p.required_in(""), vec!["server"]);
        assert_eq!(p.required_in("server"), vec!["src"]);
        assert!(p.expects_directory("server"));
        assert!(!p.expects_directory("server/src"));
    }

    #[test]
    fn test_empty_allow_list_walks_everything_in_depth() {
        let p = policy(2, &[]);
        assert!(p.selects("anything", 1));
        assert!(p.selects("a/b", 2));
        assert!(!p.selects("a/b/c", 3));
        assert!(p.required_in("").is_empty());
    }

    #[test]
    fn test_prefix_is_not_ancestor() {
        let p = policy(2, &["server"]);
        assert!(!p.selects("server-old", 1));
    }

    #[test]
    fn test_paths_normalized() {
        let p = policy(1, &["/server/", "server"]);
        assert_eq!(p.paths, vec!["server".to_string()]);
    }

    #[test]
    fn test_invalid_policies() {
        let zero = WalkPolicy { max_depth: 0, ..WalkPolicy::default() };
        assert!(matches!(zero.validate(), Err(MirrorError::Configuration(_))));

        let dotdot = WalkPolicy {
            paths: vec!["../etc".to_string()],
            output: None,
            ..WalkPolicy::default()
        };
        assert!(dotdot.validate().is_err());

        let unreachable = WalkPolicy {
            max_depth: 1,
            paths: vec!["server".to_string()],
            output: Some("server/.gitignore".to_string()),
            directories: Vec::new(),
        };
        assert!(unreachable.validate().is_err());

        let output_is_directory = WalkPolicy {
            max_depth: 1,
            paths: vec!["notes/".to_string()],
            output: Some("notes".to_string()),
            directories: Vec::new(),
        };
        assert!(matches!(output_is_directory.validate(), Err(MirrorError::Configuration(_))));
    }
}
