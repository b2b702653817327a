//! graphloom-core - Core library for graphloom.
//!
//! This crate provides the core types, collaborator traits, and the merge
//! engine that turns per-chunk entity/relationship extractions into one
//! deduplicated knowledge graph.
//!
//! # Example
//!
//! ```ignore
//! use graphloom_core::{Chunk, ExtractionSchema, GraphExpander};
//!
//! let expander = GraphExpander::new(extractor, store);
//! let chunks = expander.expand(chunks, &ExtractionSchema::default()).await?;
//! ```

pub mod config;
pub mod error;
pub mod knowledge;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{ExpandConfig, LoomConfig};
pub use error::{LoomError, LoomResult};
pub use knowledge::{normalize_id, GraphExpander, TypeRegistry};
pub use traits::{
    ExtractionSchema, Extractor, GraphStore, GraphStoreConfig, GraphStoreProvider, Llm, LlmConfig,
    NeighborParams, NeighborQuery,
};
pub use types::{Chunk, ChunkGraph, GraphEdge, GraphNode, Message, RawEdge, RawNode};
