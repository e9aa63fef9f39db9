//! Run configuration.
//!
//! Raw settings arrive as strings (flags, environment, an optional TOML file)
//! and are validated once into a [`MirrorConfig`]. Inner components receive
//! the pieces they need through their constructors.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{MirrorError, MirrorResult};
use crate::walk::WalkPolicy;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Repository coordinates on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse `owner/name`.
    pub fn parse(s: &str) -> MirrorResult<Self> {
        let mut parts = s.trim().split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(MirrorError::configuration(format!(
                "repository must be 'owner/name', got '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
        }
    }
}

impl GraphConfig {
    /// Require a non-empty URI, user and password.
    pub fn validate(self) -> MirrorResult<Self> {
        Ok(Self {
            uri: require("Neo4j URI", &self.uri)?,
            user: require("Neo4j user", &self.user)?,
            password: require("Neo4j password", &self.password)?,
        })
    }
}

/// Unvalidated settings as collected by the CLI.
#[derive(Debug, Clone, Default)]
pub struct RawSettings {
    pub repository: String,
    pub pull_request: String,
    pub github_token: String,
    pub api_url: String,
    pub graph: GraphConfig,
    pub config_file: Option<std::path::PathBuf>,
}

/// Contents of the optional TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub walk: WalkPolicy,
}

impl FileConfig {
    pub fn load(path: &Path) -> MirrorResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MirrorError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            MirrorError::configuration(format!("invalid config file {}: {}", path.display(), e))
        })
    }
}

/// Validated configuration for one mirror run.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub repo: RepoRef,
    pub pull_number: u64,
    pub github_token: String,
    pub api_url: String,
    pub graph: GraphConfig,
    pub walk: WalkPolicy,
}

impl MirrorConfig {
    /// Validate raw settings. Any failure prevents the run from starting.
    pub fn resolve(raw: RawSettings) -> MirrorResult<Self> {
        let repo = RepoRef::parse(&require("repository", &raw.repository)?)?;

        let pull_request = require("pull request number", &raw.pull_request)?;
        let pull_number = pull_request
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                MirrorError::configuration(format!(
                    "pull request number must be a positive integer, got '{}'",
                    pull_request
                ))
            })?;

        let github_token = require("GitHub token", &raw.github_token)?;
        let api_url = if raw.api_url.trim().is_empty() {
            DEFAULT_API_URL.to_string()
        } else {
            raw.api_url.trim().trim_end_matches('/').to_string()
        };

        let graph = raw.graph.validate()?;

        let file = match raw.config_file.as_deref() {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let walk = file.walk.validate()?;

        debug!(repo = %repo, pull_number, max_depth = walk.max_depth, "Configuration resolved");

        Ok(Self {
            repo,
            pull_number,
            github_token,
            api_url,
            graph,
            walk,
        })
    }
}

fn require(name: &str, value: &str) -> MirrorResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MirrorError::configuration(format!("{} is required", name)));
    }
    Ok(value.to_string())
}
