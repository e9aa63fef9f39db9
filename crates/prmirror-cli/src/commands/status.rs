//! `prmirror status`: show what the store holds.

use anyhow::{Context, Result};

use prmirror_graph::GraphClient;

use super::Neo4jArgs;
use crate::output;

pub async fn execute(args: Neo4jArgs) -> Result<()> {
    let config = args.graph_config().validate().context("Invalid configuration")?;
    let client = GraphClient::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to Neo4j at {}", config.uri))?;

    let counts = client.get_counts().await?;
    output::print_counts(&config.uri, &counts);
    Ok(())
}
