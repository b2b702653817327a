//! LLM-backed extraction of per-chunk graphs.
//!
//! # Example
//!
//! ```ignore
//! use graphloom_graph_stores::entity::LlmExtractor;
//!
//! let extractor = LlmExtractor::new(llm);
//! let graph = extractor.extract("Jake works at Acme Corp", &schema).await?;
//! ```

mod extractor;

pub use extractor::{LlmExtractor, DEFAULT_ENTITY_TYPE};
