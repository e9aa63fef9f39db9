//! Cypher-backed writer.
//!
//! Each upsert is a single statement. Nodes `MERGE` on their merge key, so
//! concurrent runs converge on one node per key. Edges are looked up by exact
//! property set and created when absent; only one run at a time should write
//! a given pull request.

use async_trait::async_trait;
use neo4rs::Query;
use tracing::debug;

use prmirror_core::{MirrorError, MirrorResult, Properties};

use super::{check_relationship, merge_value, MirrorWriter, NodeRef, StoredEntity, StoredRelationship};
use crate::GraphClient;

/// Writer over a live Neo4j connection.
#[derive(Clone)]
pub struct Neo4jWriter {
    client: GraphClient,
}

impl Neo4jWriter {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }
}

/// `MERGE` on the merge key; attributes only on create.
pub(crate) fn entity_cypher(label: &str, attributes: &Properties, merge_key: &str) -> String {
    let assignments = attributes
        .keys()
        .map(|k| format!("n.{k} = $a_{k}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "MERGE (n:{label} {{{merge_key}: $merge_value}})
         ON CREATE SET {assignments}
         RETURN keys(n) AS keys, [k IN keys(n) | toString(n[k])] AS values"
    )
}

/// `MATCH` both endpoints, then create the edge unless one with exactly
/// `properties` already joins them.
///
/// An existing edge matches only with the same key count and values, so an
/// edge carrying extra properties is a different edge.
pub(crate) fn relationship_cypher(rel_type: &str, properties: &Properties, from: &NodeRef, to: &NodeRef) -> String {
    let props = if properties.is_empty() {
        String::new()
    } else {
        let pairs = properties
            .keys()
            .map(|k| format!("{k}: $p_{k}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(" {{{pairs}}}")
    };

    let mut guard = vec![format!("size(keys(existing)) = {}", properties.len())];
    guard.extend(properties.keys().map(|k| format!("existing.{k} = $p_{k}")));

    format!(
        "MATCH (a:{from_label} {{{from_key}: $from_value}}), (b:{to_label} {{{to_key}: $to_value}})
         OPTIONAL MATCH (a)-[existing:{rel_type}]->(b) WHERE {guard}
         WITH a, b, count(existing) AS matched
         FOREACH (pending IN CASE WHEN matched = 0 THEN [1] ELSE [] END |
             CREATE (a)-[:{rel_type}{props}]->(b))
         RETURN matched = 0 AS created",
        from_label = from.label,
        from_key = from.key,
        to_label = to.label,
        to_key = to.key,
        guard = guard.join(" AND "),
    )
}

#[async_trait]
impl MirrorWriter for Neo4jWriter {
    async fn upsert_entity(
        &self,
        label: &str,
        attributes: &Properties,
        merge_key: &str,
    ) -> MirrorResult<StoredEntity> {
        let value = merge_value(label, attributes, merge_key)?;

        let mut query = Query::new(entity_cypher(label, attributes, merge_key)).param("merge_value", value);
        for (k, v) in attributes {
            query = query.param(&format!("a_{k}"), v.as_str());
        }

        let row = self
            .client
            .query(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MirrorError::transport(format!("MERGE on {} returned no row", label)))?;

        let keys: Vec<String> = row
            .get("keys")
            .map_err(|e| MirrorError::transport(format!("Failed to read node keys: {:?}", e)))?;
        let values: Vec<String> = row
            .get("values")
            .map_err(|e| MirrorError::transport(format!("Failed to read node values: {:?}", e)))?;

        debug!(label, merge_key, value, "Upserted entity");

        Ok(StoredEntity {
            label: label.to_string(),
            merge_key: merge_key.to_string(),
            attributes: keys.into_iter().zip(values).collect(),
        })
    }

    async fn upsert_relationship(
        &self,
        rel_type: &str,
        properties: &Properties,
        from: &NodeRef,
        to: &NodeRef,
    ) -> MirrorResult<Option<StoredRelationship>> {
        check_relationship(rel_type, properties, from, to)?;

        let mut query = Query::new(relationship_cypher(rel_type, properties, from, to))
            .param("from_value", from.value.as_str())
            .param("to_value", to.value.as_str());
        for (k, v) in properties {
            query = query.param(&format!("p_{k}"), v.as_str());
        }

        let rows = self.client.query(query).await?;
        let Some(row) = rows.into_iter().next() else {
            debug!(rel_type, %from, %to, "Endpoint missing, relationship not written");
            return Ok(None);
        };
        let created: bool = row.get("created").unwrap_or(false);

        debug!(rel_type, %from, %to, created, "Upserted relationship");

        Ok(Some(StoredRelationship {
            rel_type: rel_type.to_string(),
            properties: properties.clone(),
            from: from.clone(),
            to: to.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn squash(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_entity_cypher_sets_only_on_create() {
        let cypher = entity_cypher("Tree", &props(&[("sha", "t1"), ("url", "u")]), "sha");
        assert_eq!(
            squash(&cypher),
            "MERGE (n:Tree {sha: $merge_value}) ON CREATE SET n.sha = $a_sha, n.url = $a_url \
             RETURN keys(n) AS keys, [k IN keys(n) | toString(n[k])] AS values"
        );
        assert!(!cypher.contains("ON MATCH"));
    }

    #[test]
    fn test_relationship_cypher_with_name() {
        let from = NodeRef::new("Tree", "sha", "t1");
        let to = NodeRef::new("Blob", "node_id", "B_1");
        let cypher = relationship_cypher("CONTAINS", &props(&[("name", ".gitignore")]), &from, &to);
        assert_eq!(
            squash(&cypher),
            "MATCH (a:Tree {sha: $from_value}), (b:Blob {node_id: $to_value}) \
             OPTIONAL MATCH (a)-[existing:CONTAINS]->(b) \
             WHERE size(keys(existing)) = 1 AND existing.name = $p_name \
             WITH a, b, count(existing) AS matched \
             FOREACH (pending IN CASE WHEN matched = 0 THEN [1] ELSE [] END | \
             CREATE (a)-[:CONTAINS {name: $p_name}]->(b)) \
             RETURN matched = 0 AS created"
        );
    }

    #[test]
    fn test_relationship_cypher_without_properties() {
        let from = NodeRef::new("PullRequest", "node_id", "PR_1");
        let to = NodeRef::new("Commit", "node_id", "C_1");
        let cypher = relationship_cypher("HEAD", &Properties::new(), &from, &to);
        let cypher = squash(&cypher);
        assert!(cypher.contains("WHERE size(keys(existing)) = 0 WITH"));
        assert!(cypher.contains("CREATE (a)-[:HEAD]->(b)"));
        assert!(!cypher.contains("MERGE"));
    }
}
