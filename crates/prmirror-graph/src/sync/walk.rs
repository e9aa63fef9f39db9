//! Bounded walk below the head commit's root tree.

use std::collections::VecDeque;

use tracing::debug;

use prmirror_core::walk::{depth_of, join};
use prmirror_core::{EntityKind, MirrorError, MirrorResult, Tree, TreeEntryKind};
use prmirror_github::GitObjectSource;

use super::{named, Mirror, MirrorReport, CONTAINS};
use crate::writer::{MirrorWriter, StoredEntity};

/// A tree waiting to have its entries mirrored.
struct Pending {
    path: String,
    tree: Tree,
    node: StoredEntity,
}

impl<'a, S, W> Mirror<'a, S, W>
where
    S: GitObjectSource + ?Sized,
    W: MirrorWriter + ?Sized,
{
    /// Mirror the selected entries level by level, in tree order.
    pub(super) async fn walk_tree(
        &self,
        report: &mut MirrorReport,
        root: Tree,
        root_node: StoredEntity,
    ) -> MirrorResult<()> {
        let mut queue = VecDeque::from([Pending {
            path: String::new(),
            tree: root,
            node: root_node,
        }]);

        while let Some(Pending { path, tree, node }) = queue.pop_front() {
            for required in self.walk.required_in(&path) {
                if tree.entry(required).is_none() {
                    return Err(MirrorError::not_found(format!(
                        "path '{}' in tree {}",
                        join(&path, required),
                        tree.sha
                    )));
                }
            }

            for entry in &tree.entries {
                let entry_path = join(&path, &entry.path);
                let depth = depth_of(&entry_path);
                if !self.walk.selects(&entry_path, depth) {
                    continue;
                }
                self.walk.check_entry(&entry_path, entry.kind)?;

                match entry.kind {
                    TreeEntryKind::Tree => {
                        let subtree = self.source.fetch_tree(&self.repo, &entry.sha).await?;
                        let sub_node = self.entity(report, EntityKind::Tree, subtree.attributes()).await?;
                        self.link(report, CONTAINS, named(&entry.path), &node, &sub_node).await?;
                        report.trees_visited += 1;
                        debug!(path = %entry_path, sha = %entry.sha, "Tree mirrored");

                        if depth < self.walk.max_depth {
                            queue.push_back(Pending {
                                path: entry_path,
                                tree: subtree,
                                node: sub_node,
                            });
                        }
                    }
                    TreeEntryKind::Blob => {
                        let blob = self.source.fetch_blob(&self.repo, &entry.sha).await?;
                        let blob_node = self.entity(report, EntityKind::Blob, blob.attributes()).await?;
                        self.link(report, CONTAINS, named(&entry.path), &node, &blob_node).await?;
                        report.blobs_visited += 1;
                        debug!(path = %entry_path, sha = %entry.sha, "Blob mirrored");

                        if self.walk.output.as_deref() == Some(entry_path.as_str()) {
                            report.output = Some(blob.decoded_text()?);
                        }
                    }
                    TreeEntryKind::Commit => {
                        debug!(path = %entry_path, sha = %entry.sha, "Skipping submodule");
                    }
                }
            }
        }

        match self.walk.output.as_deref() {
            Some(output) if report.output.is_none() => {
                Err(MirrorError::not_found(format!("output blob '{}'", output)))
            }
            _ => Ok(()),
        }
    }
}
