//! Git object models as returned by the hosting API.

use std::collections::BTreeMap;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, MirrorResult};

/// Attribute or property set written to the graph store.
pub type Properties = BTreeMap<String, String>;

/// A pull request, reduced to what the mirror needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub node_id: String,
    pub url: String,
    pub title: String,
    pub body: String,
    pub head_sha: String,
    pub base_sha: String,
}

impl PullRequest {
    pub fn attributes(&self) -> Properties {
        props([
            ("node_id", self.node_id.as_str()),
            ("url", self.url.as_str()),
            ("title", self.title.as_str()),
            ("body", self.body.as_str()),
        ])
    }
}

/// A git commit object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub node_id: String,
    pub url: String,
    pub sha: String,
    pub message: String,
    pub tree_sha: String,
}

impl Commit {
    pub fn attributes(&self) -> Properties {
        props([
            ("node_id", self.node_id.as_str()),
            ("url", self.url.as_str()),
            ("sha", self.sha.as_str()),
            ("message", self.message.as_str()),
        ])
    }
}

/// Kind of object a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    Blob,
    Tree,
    /// Submodule pointer; never followed.
    Commit,
}

/// One named entry of a tree (a single path segment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: TreeEntryKind,
}

/// A git tree object, one level deep. Entry order is the API's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Trees are content-addressed; the API does not always assign one.
    pub node_id: Option<String>,
    pub url: String,
    pub sha: String,
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn attributes(&self) -> Properties {
        let mut attributes = props([("url", self.url.as_str()), ("sha", self.sha.as_str())]);
        if let Some(node_id) = self.node_id.as_deref().filter(|id| !id.is_empty()) {
            attributes.insert("node_id".to_string(), node_id.to_string());
        }
        attributes
    }

    /// Find the entry with the given path segment.
    pub fn entry(&self, path: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.path == path)
    }
}

/// A git blob object with its base64-encoded content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    pub node_id: String,
    pub url: String,
    pub sha: String,
    pub content_base64: String,
}

impl Blob {
    pub fn attributes(&self) -> Properties {
        props([
            ("node_id", self.node_id.as_str()),
            ("url", self.url.as_str()),
            ("sha", self.sha.as_str()),
        ])
    }

    /// Decode the content as text. The API wraps base64 at 60 columns,
    /// so whitespace is dropped before decoding.
    pub fn decoded_text(&self) -> MirrorResult<String> {
        let compact: String = self
            .content_base64
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| MirrorError::transport(format!("blob {} has invalid base64 content: {}", self.sha, e)))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn props<const N: usize>(pairs: [(&str, &str); N]) -> Properties {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(content: &str) -> Blob {
        Blob {
            node_id: "B_1".to_string(),
            url: "https://api.github.com/repos/o/r/git/blobs/b1".to_string(),
            sha: "b1".to_string(),
            content_base64: content.to_string(),
        }
    }

    #[test]
    fn test_decode_wrapped_content() {
        // "node_modules/\ndist/\n" split across lines the way the API returns it
        let b = blob("bm9kZV9tb2R1\nbGVzLwpkaXN0Lwo=\n");
        assert_eq!(b.decoded_text().unwrap(), "node_modules/\ndist/\n");
    }

    #[test]
    fn test_decode_invalid_content() {
        let err = blob("not base64!").decoded_text().unwrap_err();
        assert!(matches!(err, MirrorError::Transport(_)));
    }

    #[test]
    fn test_tree_attributes_skip_missing_node_id() {
        let tree = Tree {
            node_id: None,
            url: "u".to_string(),
            sha: "t1".to_string(),
            entries: vec![],
        };
        let attrs = tree.attributes();
        assert_eq!(attrs.get("sha").map(String::as_str), Some("t1"));
        assert!(!attrs.contains_key("node_id"));
    }

    #[test]
    fn test_tree_entry_lookup() {
        let tree = Tree {
            node_id: None,
            url: "u".to_string(),
            sha: "t1".to_string(),
            entries: vec![
                TreeEntry { path: "server".to_string(), sha: "t2".to_string(), kind: TreeEntryKind::Tree },
                TreeEntry { path: ".gitignore".to_string(), sha: "b1".to_string(), kind: TreeEntryKind::Blob },
            ],
        };
        assert_eq!(tree.entry(".gitignore").map(|e| e.kind), Some(TreeEntryKind::Blob));
        assert!(tree.entry("missing").is_none());
    }

    #[test]
    fn test_entry_kind_from_api_json() {
        let entry: TreeEntry =
            serde_json::from_str(r#"{"path":"src","sha":"abc","type":"tree"}"#).unwrap();
        assert_eq!(entry.kind, TreeEntryKind::Tree);
    }
}
