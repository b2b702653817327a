//! Document chunk type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A segment of source document text, the unit of extraction.
///
/// Chunks are produced upstream and never modified by the merge engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable chunk identifier.
    pub chunk_id: Uuid,
    /// Identifier of the document this chunk belongs to.
    pub document_id: Uuid,
    /// Chunk text.
    pub text: String,
}

impl Chunk {
    /// Create a chunk with a fresh chunk id.
    pub fn new(document_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            chunk_id: Uuid::new_v4(),
            document_id,
            text: text.into(),
        }
    }

    /// Create a chunk with an explicit chunk id.
    pub fn with_id(chunk_id: Uuid, document_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            chunk_id,
            document_id,
            text: text.into(),
        }
    }
}
