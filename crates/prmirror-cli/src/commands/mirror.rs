//! `prmirror mirror`: run the pipeline once.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use prmirror_core::{MirrorConfig, RawSettings};
use prmirror_github::GitHubClient;
use prmirror_graph::{schema, GraphClient, MemoryGraph, Mirror, MirrorReport, Neo4jWriter};

use super::Neo4jArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct MirrorArgs {
    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY", default_value = "")]
    pub repository: String,

    /// Pull request number
    #[arg(long = "pr", env = "GITHUB_PR", default_value = "")]
    pub pull_request: String,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, default_value = "")]
    pub github_token: String,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long, env = "GITHUB_API_URL", default_value = "")]
    pub api_url: String,

    #[command(flatten)]
    pub neo4j: Neo4jArgs,

    /// TOML file with a [walk] table (max_depth, paths, output)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write into an in-memory graph instead of Neo4j
    #[arg(long)]
    pub dry_run: bool,
}

impl MirrorArgs {
    pub fn raw_settings(&self) -> RawSettings {
        RawSettings {
            repository: self.repository.clone(),
            pull_request: self.pull_request.clone(),
            github_token: self.github_token.clone(),
            api_url: self.api_url.clone(),
            graph: self.neo4j.graph_config(),
            config_file: self.config.clone(),
        }
    }
}

pub async fn execute(args: MirrorArgs) -> Result<()> {
    let config = MirrorConfig::resolve(args.raw_settings()).context("Invalid configuration")?;
    let github = GitHubClient::new(&config.api_url, &config.github_token)?;

    let report = if args.dry_run {
        info!("Dry run: writing to an in-memory graph");
        let graph = MemoryGraph::new();
        let report = Mirror::new(&github, &graph, &config).run().await?;
        output::print_counts("In-memory graph", &graph.counts().await);
        report
    } else {
        // Dropped when this function returns, on every path.
        let client = GraphClient::connect(&config.graph)
            .await
            .with_context(|| format!("Failed to connect to Neo4j at {}", config.graph.uri))?;
        schema::initialize_schema(&client).await?;

        let writer = Neo4jWriter::new(client);
        Mirror::new(&github, &writer, &config)
            .run()
            .await
            .with_context(|| format!("Mirror of {}#{} failed", config.repo, config.pull_number))?
    };

    finish(&report);
    Ok(())
}

fn finish(report: &MirrorReport) {
    output::print_report(report);
    if let Some(content) = &report.output {
        print!("{}", content);
    }
}
