//! Fetcher interface.

use async_trait::async_trait;

use prmirror_core::{Blob, Commit, MirrorResult, PullRequest, RepoRef, Tree};

/// Retrieves typed git objects by identifier.
///
/// Every call is a single remote round trip: no caching, no retries.
/// Unresolvable identifiers fail with `MirrorError::NotFound`; network,
/// authentication and decoding failures with `MirrorError::Transport`.
#[async_trait]
pub trait GitObjectSource: Send + Sync {
    async fn fetch_pull_request(&self, repo: &RepoRef, number: u64) -> MirrorResult<PullRequest>;

    async fn fetch_commit(&self, repo: &RepoRef, sha: &str) -> MirrorResult<Commit>;

    /// One level of entries, in the order the platform returns them.
    async fn fetch_tree(&self, repo: &RepoRef, sha: &str) -> MirrorResult<Tree>;

    async fn fetch_blob(&self, repo: &RepoRef, sha: &str) -> MirrorResult<Blob>;
}
