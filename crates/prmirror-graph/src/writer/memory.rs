//! In-process graph store.
//!
//! Implements the same merge semantics as the Cypher writer; backs
//! `--dry-run` and the mirror scenarios in tests.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use prmirror_core::{MirrorResult, Properties};

use super::{check_relationship, merge_value, MirrorWriter, NodeRef, StoredEntity, StoredRelationship};
use crate::GraphCounts;

#[derive(Default)]
struct State {
    nodes: Vec<StoredEntity>,
    edges: Vec<StoredRelationship>,
}

/// Graph held in memory for the lifetime of the value.
#[derive(Default)]
pub struct MemoryGraph {
    state: RwLock<State>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// All nodes with `label`, in creation order.
    pub async fn nodes(&self, label: &str) -> Vec<StoredEntity> {
        let state = self.state.read().await;
        state.nodes.iter().filter(|n| n.label == label).cloned().collect()
    }

    /// All edges of `rel_type`, in creation order.
    pub async fn relationships(&self, rel_type: &str) -> Vec<StoredRelationship> {
        let state = self.state.read().await;
        state.edges.iter().filter(|e| e.rel_type == rel_type).cloned().collect()
    }

    pub async fn counts(&self) -> GraphCounts {
        let state = self.state.read().await;
        GraphCounts {
            nodes: state.nodes.len(),
            relationships: state.edges.len(),
        }
    }
}

fn matches(node: &StoredEntity, r: &NodeRef) -> bool {
    node.label == r.label && node.attributes.get(&r.key) == Some(&r.value)
}

#[async_trait]
impl MirrorWriter for MemoryGraph {
    async fn upsert_entity(
        &self,
        label: &str,
        attributes: &Properties,
        merge_key: &str,
    ) -> MirrorResult<StoredEntity> {
        let value = merge_value(label, attributes, merge_key)?;
        let key = NodeRef::new(label, merge_key, value);

        let mut state = self.state.write().await;
        if let Some(existing) = state.nodes.iter().find(|n| matches(n, &key)) {
            return Ok(StoredEntity {
                merge_key: merge_key.to_string(),
                ..existing.clone()
            });
        }

        let node = StoredEntity {
            label: label.to_string(),
            merge_key: merge_key.to_string(),
            attributes: attributes.clone(),
        };
        state.nodes.push(node.clone());
        debug!(label, merge_key, value, "Created entity");
        Ok(node)
    }

    async fn upsert_relationship(
        &self,
        rel_type: &str,
        properties: &Properties,
        from: &NodeRef,
        to: &NodeRef,
    ) -> MirrorResult<Option<StoredRelationship>> {
        check_relationship(rel_type, properties, from, to)?;

        let mut state = self.state.write().await;
        let from_node = state.nodes.iter().position(|n| matches(n, from));
        let to_node = state.nodes.iter().position(|n| matches(n, to));
        let (Some(from_idx), Some(to_idx)) = (from_node, to_node) else {
            debug!(rel_type, %from, %to, "Endpoint missing, relationship not written");
            return Ok(None);
        };

        // Edges are identified by their endpoint nodes, not by the key used to reach them.
        let from = state.nodes[from_idx].node_ref();
        let to = state.nodes[to_idx].node_ref();

        let edge = StoredRelationship {
            rel_type: rel_type.to_string(),
            properties: properties.clone(),
            from,
            to,
        };
        if !state.edges.contains(&edge) {
            state.edges.push(edge.clone());
            debug!(rel_type, from = %edge.from, to = %edge.to, "Created relationship");
        }
        Ok(Some(edge))
    }
}
