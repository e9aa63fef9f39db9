//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use prmirror_core::GraphConfig;

pub mod mirror;
pub mod schema;
pub mod status;

/// Mirror a pull request's commits, trees and blobs into a Neo4j graph
#[derive(Parser)]
#[command(name = "prmirror")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also append logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mirror the pull request and print the output blob
    Mirror(mirror::MirrorArgs),

    /// Create uniqueness constraints for the merge keys
    Schema(Neo4jArgs),

    /// Show node and relationship counts
    Status(Neo4jArgs),
}

/// Neo4j connection settings.
#[derive(Args, Debug, Clone)]
pub struct Neo4jArgs {
    /// Bolt URI
    #[arg(long, env = "NEO4J_URI", default_value = "bolt://localhost:7687")]
    pub neo4j_uri: String,

    /// Database user
    #[arg(long, env = "NEO4J_USER", default_value = "neo4j")]
    pub neo4j_user: String,

    /// Database password
    #[arg(long, env = "NEO4J_PASSWORD", hide_env_values = true, default_value = "")]
    pub neo4j_password: String,
}

impl Neo4jArgs {
    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            uri: self.neo4j_uri.clone(),
            user: self.neo4j_user.clone(),
            password: self.neo4j_password.clone(),
        }
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Mirror(args) => mirror::execute(args).await,
            Commands::Schema(args) => schema::execute(args).await,
            Commands::Status(args) => status::execute(args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_mirror_flags() {
        let cli = Cli::try_parse_from([
            "prmirror",
            "mirror",
            "--repository",
            "acme/widgets",
            "--pr",
            "7",
            "--github-token",
            "t0ken",
            "--neo4j-password",
            "secret",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Mirror(args) => {
                assert!(args.dry_run);
                let raw = args.raw_settings();
                assert_eq!(raw.repository, "acme/widgets");
                assert_eq!(raw.pull_request, "7");
                assert_eq!(raw.graph.password, "secret");
            }
            _ => panic!("expected mirror command"),
        }
    }
}
