//! `prmirror schema`: create merge-key constraints.

use anyhow::{Context, Result};
use colored::Colorize;

use prmirror_graph::{schema, GraphClient};

use super::Neo4jArgs;

pub async fn execute(args: Neo4jArgs) -> Result<()> {
    let config = args.graph_config().validate().context("Invalid configuration")?;
    let client = GraphClient::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to Neo4j at {}", config.uri))?;

    schema::initialize_schema(&client).await?;

    eprintln!("{}", "Schema initialized.".green().bold());
    for statement in schema::schema_statements() {
        eprintln!("  {}", statement.dimmed());
    }
    Ok(())
}
