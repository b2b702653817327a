//! Knowledge graph construction from chunk extractions.
//!
//! # Components
//!
//! - `identity`: label normalization into canonical node ids
//! - `registry`: type-node bookkeeping for one merge pass
//! - `expand`: concurrent extraction, synthesis and batch commit
//!
//! # Example
//!
//! ```ignore
//! use graphloom_core::knowledge::GraphExpander;
//!
//! let expander = GraphExpander::new(extractor, store);
//! let chunks = expander.expand(chunks, &ExtractionSchema::default()).await?;
//! ```

mod expand;
mod identity;
mod registry;

pub use expand::{synthesize, GraphBatch, GraphExpander};
pub use identity::{display_type, normalize_id};
pub use registry::TypeRegistry;
