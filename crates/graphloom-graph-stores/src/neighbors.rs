//! Neighbor queries: descriptions of nodes sharing the target's layer.

use std::sync::Arc;

use async_trait::async_trait;

use graphloom_core::error::LoomResult;
use graphloom_core::traits::{
    resolve_target, NeighborParams, NeighborQuery, DESCRIPTION_ATTRIBUTE, GROUPING_ATTRIBUTE,
};

use crate::embedded::EmbeddedGraphStore;

/// Neighbor query over the embedded store.
///
/// Scans every node, so cost grows with the graph.
pub struct InMemoryNeighborQuery {
    store: Arc<EmbeddedGraphStore>,
}

impl InMemoryNeighborQuery {
    pub fn new(store: Arc<EmbeddedGraphStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NeighborQuery for InMemoryNeighborQuery {
    async fn find_neighbors(
        &self,
        query: &str,
        params: Option<&NeighborParams>,
    ) -> LoomResult<Vec<String>> {
        let Some(node_id) = resolve_target(query, params) else {
            return Ok(vec![]);
        };

        let layer = self
            .store
            .node_attributes(node_id)?
            .and_then(|attributes| attributes.get(GROUPING_ATTRIBUTE).cloned());
        let Some(layer) = layer.filter(|l| !l.is_null()) else {
            tracing::debug!("Node '{}' has no {}; no neighbors", node_id, GROUPING_ATTRIBUTE);
            return Ok(vec![]);
        };

        let mut descriptions = Vec::new();
        self.store.scan_nodes(|_, attributes| {
            if attributes.get(GROUPING_ATTRIBUTE) == Some(&layer) {
                if let Some(description) = attributes.get(DESCRIPTION_ATTRIBUTE).and_then(|d| d.as_str()) {
                    descriptions.push(description.to_string());
                }
            }
        })?;

        Ok(descriptions)
    }
}

#[cfg(any(feature = "neo4j", feature = "memgraph"))]
pub use bolt::BoltNeighborQuery;

#[cfg(any(feature = "neo4j", feature = "memgraph"))]
mod bolt {
    use super::*;
    use crate::neo4j::Neo4jGraphStore;

    const NEIGHBORS_QUERY: &str = r#"
        MATCH (target {id: $node_id})
        WHERE target.layer_uuid IS NOT NULL
        MATCH (n)
        WHERE n.layer_uuid = target.layer_uuid AND n.description IS NOT NULL
        RETURN n.description AS description
        ORDER BY n.id
    "#;

    /// Neighbor query answered by a Bolt server in one round trip.
    pub struct BoltNeighborQuery {
        store: Arc<Neo4jGraphStore>,
    }

    impl BoltNeighborQuery {
        pub fn new(store: Arc<Neo4jGraphStore>) -> Self {
            Self { store }
        }
    }

    #[async_trait]
    impl NeighborQuery for BoltNeighborQuery {
        async fn find_neighbors(
            &self,
            query: &str,
            params: Option<&NeighborParams>,
        ) -> LoomResult<Vec<String>> {
            let Some(node_id) = resolve_target(query, params) else {
                return Ok(vec![]);
            };

            self.store
                .fetch_strings(
                    NEIGHBORS_QUERY,
                    &[("node_id", node_id.to_string())],
                    DESCRIPTION_ATTRIBUTE,
                )
                .await
        }
    }
}
