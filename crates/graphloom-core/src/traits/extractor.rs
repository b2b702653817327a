//! Extractor trait - turns chunk text into a raw graph.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LoomResult;
use crate::types::ChunkGraph;

/// Shape hints for extraction.
///
/// Empty lists leave the extractor free to choose any entity type or
/// relationship label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    /// Entity types the extractor should prefer.
    #[serde(default)]
    pub entity_types: Vec<String>,
    /// Relationship labels the extractor should prefer.
    #[serde(default)]
    pub relationship_types: Vec<String>,
}

impl ExtractionSchema {
    /// Schema with preferred entity types.
    pub fn with_entity_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Schema with preferred relationship labels.
    pub fn with_relationship_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationship_types = types.into_iter().map(Into::into).collect();
        self
    }
}

/// Extraction collaborator used by the merge engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract a raw graph from `text`.
    ///
    /// `Ok(None)` means nothing could be extracted.
    async fn extract(&self, text: &str, schema: &ExtractionSchema) -> LoomResult<Option<ChunkGraph>>;
}
