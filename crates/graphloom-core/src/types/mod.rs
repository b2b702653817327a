//! Core types for graphloom.

mod chunk;
mod graph;
mod message;

pub use chunk::*;
pub use graph::*;
pub use message::*;
