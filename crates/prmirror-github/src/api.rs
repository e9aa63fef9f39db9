//! GitHub REST response shapes and their mapping onto core models.

use base64::Engine;
use serde::Deserialize;

use prmirror_core::{Blob, Commit, PullRequest, Tree, TreeEntry};

#[derive(Deserialize)]
pub(crate) struct PullRequestResponse {
    number: u64,
    node_id: String,
    url: String,
    title: String,
    #[serde(default)]
    body: Option<String>,
    head: GitRef,
    base: GitRef,
}

#[derive(Deserialize)]
struct GitRef {
    sha: String,
}

#[derive(Deserialize)]
pub(crate) struct CommitResponse {
    node_id: String,
    url: String,
    sha: String,
    message: String,
    tree: GitRef,
}

#[derive(Deserialize)]
pub(crate) struct TreeResponse {
    #[serde(default)]
    node_id: Option<String>,
    url: String,
    sha: String,
    tree: Vec<TreeEntry>,
    #[serde(default)]
    pub(crate) truncated: bool,
}

#[derive(Deserialize)]
pub(crate) struct BlobResponse {
    node_id: String,
    url: String,
    sha: String,
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

impl From<PullRequestResponse> for PullRequest {
    fn from(r: PullRequestResponse) -> Self {
        Self {
            number: r.number,
            node_id: r.node_id,
            url: r.url,
            title: r.title,
            body: r.body.unwrap_or_default(),
            head_sha: r.head.sha,
            base_sha: r.base.sha,
        }
    }
}

impl From<CommitResponse> for Commit {
    fn from(r: CommitResponse) -> Self {
        Self {
            node_id: r.node_id,
            url: r.url,
            sha: r.sha,
            message: r.message,
            tree_sha: r.tree.sha,
        }
    }
}

impl From<TreeResponse> for Tree {
    fn from(r: TreeResponse) -> Self {
        Self {
            node_id: r.node_id,
            url: r.url,
            sha: r.sha,
            entries: r.tree,
        }
    }
}

impl From<BlobResponse> for Blob {
    fn from(r: BlobResponse) -> Self {
        // Small text blobs may come back as utf-8; keep the model base64 throughout.
        let content_base64 = match r.encoding.as_deref() {
            Some("utf-8") | Some("utf8") => {
                base64::engine::general_purpose::STANDARD.encode(r.content.as_bytes())
            }
            _ => r.content,
        };

        Self {
            node_id: r.node_id,
            url: r.url,
            sha: r.sha,
            content_base64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prmirror_core::TreeEntryKind;

    #[test]
    fn test_pull_request_null_body() {
        let json = r#"{
            "number": 7,
            "node_id": "PR_kwDO",
            "url": "https://api.github.com/repos/acme/widgets/pulls/7",
            "html_url": "https://github.com/acme/widgets/pull/7",
            "title": "Add server",
            "body": null,
            "head": {"sha": "h1", "ref": "feature"},
            "base": {"sha": "b1", "ref": "main"}
        }"#;
        let pr: PullRequest = serde_json::from_str::<PullRequestResponse>(json).unwrap().into();
        assert_eq!(pr.body, "");
        assert_eq!(pr.head_sha, "h1");
        assert_eq!(pr.base_sha, "b1");
    }

    #[test]
    fn test_tree_keeps_entry_order() {
        let json = r#"{
            "sha": "t1",
            "url": "https://api.github.com/repos/acme/widgets/git/trees/t1",
            "truncated": false,
            "tree": [
                {"path": ".gitignore", "mode": "100644", "type": "blob", "sha": "b1", "size": 12},
                {"path": "server", "mode": "040000", "type": "tree", "sha": "t2"},
                {"path": "vendor", "mode": "160000", "type": "commit", "sha": "c9"}
            ]
        }"#;
        let tree: Tree = serde_json::from_str::<TreeResponse>(json).unwrap().into();
        assert_eq!(tree.node_id, None);
        let kinds: Vec<_> = tree.entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![TreeEntryKind::Blob, TreeEntryKind::Tree, TreeEntryKind::Commit]);
        assert_eq!(tree.entries[1].path, "server");
    }

    #[test]
    fn test_utf8_blob_reencoded() {
        let json = r#"{"node_id": "B_1", "url": "u", "sha": "b1", "content": "dist/\n", "encoding": "utf-8"}"#;
        let blob: Blob = serde_json::from_str::<BlobResponse>(json).unwrap().into();
        assert_eq!(blob.decoded_text().unwrap(), "dist/\n");
    }
}
