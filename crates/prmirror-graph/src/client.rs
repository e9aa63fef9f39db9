//! Neo4j connection client.

use neo4rs::{ConfigBuilder, Graph, Query};
use serde::de::DeserializeOwned;

use prmirror_core::{GraphConfig, MirrorError, MirrorResult};

/// Client for Neo4j graph operations.
///
/// Holds the connection pool for one run; dropping it releases the session.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// `Graph::connect` only builds the pool, so a `RETURN 1` ping forces the
    /// bolt handshake and an unreachable server fails here, before any write.
    pub async fn connect(config: &GraphConfig) -> MirrorResult<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db("neo4j")
            .max_connections(2)
            .fetch_size(20)
            .build()
            .map_err(|e| MirrorError::transport(format!("Failed to build Neo4j config: {}", e)))?;

        let graph = Graph::connect(neo4j_config)
            .await
            .map_err(|e| MirrorError::transport(format!("Failed to create Neo4j connection pool: {}", e)))?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .map_err(|e| MirrorError::transport(format!("Neo4j is not responding to queries: {}", e)))?;

        Ok(Self { graph })
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query) -> MirrorResult<()> {
        self.graph
            .run(query)
            .await
            .map_err(|e| MirrorError::transport(format!("Neo4j query execution failed: {}", e)))
    }

    /// Execute a Cypher query and return results as rows.
    pub async fn query(&self, query: Query) -> MirrorResult<Vec<neo4rs::Row>> {
        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| MirrorError::transport(format!("Neo4j query failed: {}", e)))?;

        let mut rows = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| MirrorError::transport(format!("Neo4j stream failed: {}", e)))?
        {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn query_scalar<T: DeserializeOwned>(&self, query: Query, field: &str) -> MirrorResult<Option<T>> {
        let rows = self.query(query).await?;
        if let Some(row) = rows.into_iter().next() {
            let val: T = row.get(field).map_err(|e| {
                MirrorError::transport(format!("Failed to get field '{}': {:?}", field, e))
            })?;
            Ok(Some(val))
        } else {
            Ok(None)
        }
    }

    /// Get node and relationship counts for status display.
    pub async fn get_counts(&self) -> MirrorResult<GraphCounts> {
        let node_query = Query::new("MATCH (n) RETURN count(n) as count".to_string());
        let rel_query = Query::new("MATCH ()-[r]->() RETURN count(r) as count".to_string());

        let node_count: i64 = self.query_scalar(node_query, "count").await?
            .unwrap_or(0);
        let rel_count: i64 = self.query_scalar(rel_query, "count").await?
            .unwrap_or(0);

        Ok(GraphCounts {
            nodes: node_count as usize,
            relationships: rel_count as usize,
        })
    }
}

/// Node and relationship counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Nothing listens on port 1.
        let config = GraphConfig {
            uri: "bolt://127.0.0.1:1".to_string(),
            user: "neo4j".to_string(),
            password: "secret".to_string(),
        };

        let err = GraphClient::connect(&config).await.err().unwrap();
        assert!(matches!(err, MirrorError::Transport(_)), "{err:?}");
    }
}
