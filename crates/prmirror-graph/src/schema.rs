//! Neo4j schema initialization (uniqueness constraints on merge keys).

use neo4rs::Query;
use tracing::info;

use prmirror_core::{EntityKind, MirrorResult};

use crate::GraphClient;

/// One uniqueness constraint per entity type, on its merge key.
pub fn schema_statements() -> Vec<String> {
    EntityKind::ALL
        .iter()
        .map(|kind| {
            let label = kind.label();
            let key = kind.merge_key();
            format!(
                "CREATE CONSTRAINT {}_{} IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
                label.to_lowercase(),
                key,
                label,
                key
            )
        })
        .collect()
}

/// Initialize Neo4j schema with constraints.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses.
pub async fn initialize_schema(client: &GraphClient) -> MirrorResult<()> {
    info!("Initializing Neo4j schema...");

    let statements = schema_statements();
    for statement in &statements {
        client.execute(Query::new(statement.clone())).await?;
    }

    info!("Neo4j schema initialized ({} statements)", statements.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraints_follow_identity_policy() {
        let statements = schema_statements();
        assert_eq!(statements.len(), 4);
        assert!(statements.contains(
            &"CREATE CONSTRAINT tree_sha IF NOT EXISTS FOR (n:Tree) REQUIRE n.sha IS UNIQUE".to_string()
        ));
        assert!(statements.contains(
            &"CREATE CONSTRAINT pullrequest_node_id IF NOT EXISTS FOR (n:PullRequest) REQUIRE n.node_id IS UNIQUE"
                .to_string()
        ));
    }
}
