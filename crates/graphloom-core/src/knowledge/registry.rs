//! Type-node bookkeeping for a single merge pass.

use std::collections::{BTreeSet, HashMap};

use crate::error::LoomResult;
use crate::traits::GraphStore;
use crate::types::{ChunkGraph, GraphNode};

use super::identity::normalize_id;

/// Type nodes known to exist, keyed by canonical id.
///
/// Seeded once from the store, then updated in memory as the merge pass
/// creates new type nodes. Lives for exactly one `expand` call.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    known: HashMap<String, GraphNode>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry from the type nodes of `graphs` that already exist in `store`.
    ///
    /// Issues a single lookup for the deduplicated set of type ids, and none
    /// when the graphs carry no nodes.
    pub async fn seed<'a, I>(store: &dyn GraphStore, graphs: I) -> LoomResult<Self>
    where
        I: IntoIterator<Item = &'a ChunkGraph>,
    {
        let type_ids: BTreeSet<String> = graphs
            .into_iter()
            .flat_map(|graph| graph.nodes.iter())
            .map(|node| normalize_id(&node.entity_type))
            .collect();

        if type_ids.is_empty() {
            return Ok(Self::new());
        }

        let ids: Vec<String> = type_ids.into_iter().collect();
        let existing = store.lookup_nodes(&ids).await?;

        tracing::debug!(
            "Type registry seeded: {} of {} type nodes already exist",
            existing.len(),
            ids.len()
        );

        Ok(Self::from_nodes(existing))
    }

    /// Registry over already-known type nodes.
    pub fn from_nodes(nodes: impl IntoIterator<Item = GraphNode>) -> Self {
        Self {
            known: nodes.into_iter().map(|node| (node.id.clone(), node)).collect(),
        }
    }

    /// Whether a type node with this id exists.
    pub fn contains(&self, type_id: &str) -> bool {
        self.known.contains_key(type_id)
    }

    /// Get a known type node.
    pub fn get(&self, type_id: &str) -> Option<&GraphNode> {
        self.known.get(type_id)
    }

    /// Record a newly created type node.
    pub fn register(&mut self, node: GraphNode) {
        self.known.insert(node.id.clone(), node);
    }

    /// Number of known type nodes.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Check if no type nodes are known.
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
