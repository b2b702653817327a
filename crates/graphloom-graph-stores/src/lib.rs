//! graphloom-graph-stores - Graph store implementations for graphloom.
//!
//! This crate provides the concrete stores the merge engine writes to, the
//! neighbor queries that read them back, and an LLM-backed extractor.
//!
//! # Supported Backends
//!
//! - **Embedded** (always available) - petgraph in memory, persisted to SQLite
//! - **Neo4j** (feature: `neo4j`) - Neo4j graph database
//! - **Memgraph** (feature: `memgraph`) - Memgraph (Neo4j-compatible)

pub mod embedded;
pub mod entity;
mod factory;
mod neighbors;

#[cfg(any(feature = "neo4j", feature = "memgraph"))]
mod neo4j;

pub use embedded::EmbeddedGraphStore;
pub use entity::LlmExtractor;
pub use factory::{GraphHandle, GraphStoreFactory};
pub use neighbors::InMemoryNeighborQuery;

#[cfg(any(feature = "neo4j", feature = "memgraph"))]
pub use neighbors::BoltNeighborQuery;

#[cfg(any(feature = "neo4j", feature = "memgraph"))]
pub use neo4j::Neo4jGraphStore;

// Re-export core types
pub use graphloom_core::traits::{
    GraphStore, GraphStoreConfig, GraphStoreProvider, NeighborParams, NeighborQuery,
};
