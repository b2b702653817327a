//! Core traits for graphloom collaborators.

mod extractor;
mod graph_store;
mod llm;
mod neighbor;

pub use extractor::*;
pub use graph_store::*;
pub use llm::*;
pub use neighbor::*;
