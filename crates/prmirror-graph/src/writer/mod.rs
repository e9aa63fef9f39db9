//! Idempotent graph writes.
//!
//! Two primitives: create-or-match a node by its merge key, and
//! create-or-match a typed edge between two existing nodes. Attributes are
//! written only when a node is created; a later upsert with the same merge
//! key returns the stored node untouched.

mod memory;
mod neo4j;

pub use memory::MemoryGraph;
pub use neo4j::Neo4jWriter;

use async_trait::async_trait;
use serde::Serialize;

use prmirror_core::{MirrorError, MirrorResult, Properties};

/// A node as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEntity {
    pub label: String,
    pub merge_key: String,
    pub attributes: Properties,
}

impl StoredEntity {
    /// Reference to this node by its merge key.
    pub fn node_ref(&self) -> NodeRef {
        NodeRef {
            label: self.label.clone(),
            key: self.merge_key.clone(),
            value: self.attributes.get(&self.merge_key).cloned().unwrap_or_default(),
        }
    }
}

/// Identifies an endpoint node by label and merge key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NodeRef {
    pub label: String,
    pub key: String,
    pub value: String,
}

impl NodeRef {
    pub fn new(label: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}:{}={})", self.label, self.key, self.value)
    }
}

/// A directed, typed edge as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRelationship {
    pub rel_type: String,
    pub properties: Properties,
    pub from: NodeRef,
    pub to: NodeRef,
}

/// Idempotent writer over a graph store.
#[async_trait]
pub trait MirrorWriter: Send + Sync {
    /// Create the node if no `label` node has `attributes[merge_key]`,
    /// otherwise return the existing node unchanged.
    async fn upsert_entity(
        &self,
        label: &str,
        attributes: &Properties,
        merge_key: &str,
    ) -> MirrorResult<StoredEntity>;

    /// Create-or-match a `rel_type` edge whose properties equal `properties`.
    ///
    /// Equality is exact: an edge with extra properties does not match, and a
    /// property-less request matches only a property-less edge. Endpoints are
    /// never created. Returns `None` when either endpoint is
    /// absent from the store.
    async fn upsert_relationship(
        &self,
        rel_type: &str,
        properties: &Properties,
        from: &NodeRef,
        to: &NodeRef,
    ) -> MirrorResult<Option<StoredRelationship>>;
}

/// Labels, relationship types and property keys end up in Cypher text.
pub(crate) fn check_identifier(what: &str, name: &str) -> MirrorResult<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(MirrorError::validation(format!("invalid {} '{}'", what, name)))
    }
}

/// The non-empty merge key value of an entity write.
pub(crate) fn merge_value<'a>(label: &str, attributes: &'a Properties, merge_key: &str) -> MirrorResult<&'a str> {
    check_identifier("label", label)?;
    check_identifier("merge key", merge_key)?;
    for key in attributes.keys() {
        check_identifier("attribute", key)?;
    }

    attributes
        .get(merge_key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            MirrorError::validation(format!("{} is missing its merge key '{}'", label, merge_key))
        })
}

/// Validate a relationship write before touching the store.
pub(crate) fn check_relationship(
    rel_type: &str,
    properties: &Properties,
    from: &NodeRef,
    to: &NodeRef,
) -> MirrorResult<()> {
    check_identifier("relationship type", rel_type)?;
    for key in properties.keys() {
        check_identifier("property", key)?;
    }
    for endpoint in [from, to] {
        check_identifier("label", &endpoint.label)?;
        check_identifier("merge key", &endpoint.key)?;
        if endpoint.value.trim().is_empty() {
            return Err(MirrorError::validation(format!(
                "{} endpoint of {} is missing its merge key '{}'",
                endpoint.label, rel_type, endpoint.key
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(check_identifier("label", "PullRequest").is_ok());
        assert!(check_identifier("key", "node_id").is_ok());
        for bad in ["", "1abc", "a-b", "x} DETACH DELETE n //", "with space"] {
            assert!(check_identifier("label", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_merge_value_required() {
        let mut attrs = Properties::new();
        attrs.insert("url".to_string(), "u".to_string());
        assert!(matches!(
            merge_value("Commit", &attrs, "node_id"),
            Err(MirrorError::Validation(_))
        ));

        attrs.insert("node_id".to_string(), " ".to_string());
        assert!(merge_value("Commit", &attrs, "node_id").is_err());

        attrs.insert("node_id".to_string(), "C_1".to_string());
        assert_eq!(merge_value("Commit", &attrs, "node_id").unwrap(), "C_1");
    }

    #[test]
    fn test_endpoint_without_key_rejected() {
        let from = NodeRef::new("PullRequest", "node_id", "PR_1");
        let to = NodeRef::new("Commit", "node_id", "");
        let err = check_relationship("HEAD", &Properties::new(), &from, &to).unwrap_err();
        assert!(matches!(err, MirrorError::Validation(_)));
    }
}
