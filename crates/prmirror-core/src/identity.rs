//! Per-entity identity policy.
//!
//! Every mirrored node type has exactly one merge key, the attribute used to
//! test for an existing node before creating one. Trees are content-addressed
//! and merge on `sha`; everything else merges on the platform `node_id`.

use serde::Serialize;

/// Entity types mirrored into the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    PullRequest,
    Commit,
    Tree,
    Blob,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::PullRequest,
        EntityKind::Commit,
        EntityKind::Tree,
        EntityKind::Blob,
    ];

    /// The graph node label for this entity type.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::PullRequest => "PullRequest",
            EntityKind::Commit => "Commit",
            EntityKind::Tree => "Tree",
            EntityKind::Blob => "Blob",
        }
    }

    /// The attribute this entity type is merged on.
    pub fn merge_key(&self) -> &'static str {
        match self {
            EntityKind::Tree => "sha",
            EntityKind::PullRequest | EntityKind::Commit | EntityKind::Blob => "node_id",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trees_merge_on_sha() {
        assert_eq!(EntityKind::Tree.merge_key(), "sha");
        for kind in [EntityKind::PullRequest, EntityKind::Commit, EntityKind::Blob] {
            assert_eq!(kind.merge_key(), "node_id", "{kind}");
        }
    }
}
