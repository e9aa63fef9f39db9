//! GitHub REST client for pull requests and git database objects.
//!
//! Uses `/repos/{owner}/{repo}/pulls/{number}` and the
//! `/repos/{owner}/{repo}/git/{commits,trees,blobs}/{sha}` endpoints.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use prmirror_core::{Blob, Commit, MirrorError, MirrorResult, PullRequest, RepoRef, Tree};

use crate::api::{BlobResponse, CommitResponse, PullRequestResponse, TreeResponse};
use crate::source::GitObjectSource;

/// REST API version pinned in every request.
pub const API_VERSION: &str = "2022-11-28";

/// GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    base_url: String,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client for the API at `base_url`, authenticated with `token`.
    pub fn new(base_url: &str, token: &str) -> MirrorResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("prmirror/", env!("CARGO_PKG_VERSION"))),
        );

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| MirrorError::configuration("GitHub token contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MirrorError::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// GET a repository-scoped path and decode the JSON body.
    async fn get<T: DeserializeOwned>(&self, repo: &RepoRef, path: &str, what: &str) -> MirrorResult<T> {
        let url = format!("{}/repos/{}/{}/{}", self.base_url, repo.owner, repo.name, path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MirrorError::transport(format!("request for {} failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, what, repo, &body));
        }

        response
            .json()
            .await
            .map_err(|e| MirrorError::transport(format!("failed to parse {}: {}", what, e)))
    }
}

/// Map a non-success status to an error kind.
///
/// 422 is what the git database endpoints answer for malformed SHAs.
fn status_error(status: StatusCode, what: &str, repo: &RepoRef, body: &str) -> MirrorError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            MirrorError::not_found(format!("{} in {}", what, repo))
        }
        _ => MirrorError::transport(format!("GitHub API error ({}) for {}: {}", status, what, message)),
    }
}

#[async_trait]
impl GitObjectSource for GitHubClient {
    async fn fetch_pull_request(&self, repo: &RepoRef, number: u64) -> MirrorResult<PullRequest> {
        let what = format!("pull request #{}", number);
        let response: PullRequestResponse = self.get(repo, &format!("pulls/{}", number), &what).await?;
        Ok(response.into())
    }

    async fn fetch_commit(&self, repo: &RepoRef, sha: &str) -> MirrorResult<Commit> {
        let what = format!("commit {}", sha);
        let response: CommitResponse = self.get(repo, &format!("git/commits/{}", sha), &what).await?;
        Ok(response.into())
    }

    async fn fetch_tree(&self, repo: &RepoRef, sha: &str) -> MirrorResult<Tree> {
        let what = format!("tree {}", sha);
        let response: TreeResponse = self.get(repo, &format!("git/trees/{}", sha), &what).await?;
        if response.truncated {
            warn!(sha, "Tree listing truncated by the API");
        }
        Ok(response.into())
    }

    async fn fetch_blob(&self, repo: &RepoRef, sha: &str) -> MirrorResult<Blob> {
        let what = format!("blob {}", sha);
        let response: BlobResponse = self.get(repo, &format!("git/blobs/{}", sha), &what).await?;
        Ok(response.into())
    }
}
