//! # prmirror Graph
//!
//! Neo4j side of the mirror.
//!
//! Provides the connection client, schema constraints, the idempotent
//! [`MirrorWriter`] primitives and the [`Mirror`] pipeline that drives them.

pub mod client;
pub mod schema;
pub mod sync;
pub mod writer;

pub use client::{GraphClient, GraphCounts};
pub use sync::{Mirror, MirrorReport};
pub use writer::{MemoryGraph, MirrorWriter, Neo4jWriter, NodeRef, StoredEntity, StoredRelationship};
