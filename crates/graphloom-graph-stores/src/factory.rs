//! Factory for creating graph stores and their neighbor queries.

use std::sync::Arc;

use graphloom_core::error::{LoomError, LoomResult};
use graphloom_core::traits::{GraphStore, GraphStoreConfig, GraphStoreProvider, NeighborQuery};

use crate::embedded::EmbeddedGraphStore;
use crate::neighbors::InMemoryNeighborQuery;

#[cfg(any(feature = "neo4j", feature = "memgraph"))]
use crate::{neighbors::BoltNeighborQuery, neo4j::Neo4jGraphStore};

/// A concrete graph store.
///
/// Keeps the backend visible so query-side components can be paired with it.
#[derive(Clone)]
pub enum GraphHandle {
    /// In-process store.
    Embedded(Arc<EmbeddedGraphStore>),
    /// Neo4j or Memgraph server.
    #[cfg(any(feature = "neo4j", feature = "memgraph"))]
    Bolt(Arc<Neo4jGraphStore>),
}

impl GraphHandle {
    /// The store as a [`GraphStore`] for the merge engine.
    pub fn store(&self) -> Arc<dyn GraphStore> {
        match self {
            Self::Embedded(store) => store.clone(),
            #[cfg(any(feature = "neo4j", feature = "memgraph"))]
            Self::Bolt(store) => store.clone(),
        }
    }

    /// Short name of the backend kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Embedded(_) => "embedded",
            #[cfg(any(feature = "neo4j", feature = "memgraph"))]
            Self::Bolt(_) => "bolt",
        }
    }
}

impl std::fmt::Debug for GraphHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GraphHandle").field(&self.kind()).finish()
    }
}

/// Factory for creating graph store providers.
pub struct GraphStoreFactory;

impl GraphStoreFactory {
    /// Create a graph store from the given configuration.
    pub async fn create(config: &GraphStoreConfig) -> LoomResult<GraphHandle> {
        match config.provider {
            GraphStoreProvider::Embedded => {
                let store = EmbeddedGraphStore::from_config(config)?;
                Ok(GraphHandle::Embedded(Arc::new(store)))
            }

            #[cfg(any(feature = "neo4j", feature = "memgraph"))]
            GraphStoreProvider::Neo4j | GraphStoreProvider::Memgraph => {
                let store = Neo4jGraphStore::new(config.clone()).await?;
                Ok(GraphHandle::Bolt(Arc::new(store)))
            }

            #[allow(unreachable_patterns)]
            provider => Err(LoomError::unsupported_provider(provider)),
        }
    }

    /// Create an embedded graph store backed by the SQLite file at `path`.
    pub async fn embedded(path: &str) -> LoomResult<GraphHandle> {
        Self::create(&GraphStoreConfig::embedded(path)).await
    }

    /// Create a Neo4j graph store.
    #[cfg(feature = "neo4j")]
    pub async fn neo4j(uri: &str, username: &str, password: &str) -> LoomResult<GraphHandle> {
        Self::create(&GraphStoreConfig::neo4j(uri, username, password)).await
    }

    /// Pick the neighbor query for `provider`, checking that `handle` belongs to it.
    pub fn neighbor_query(
        provider: GraphStoreProvider,
        handle: &GraphHandle,
    ) -> LoomResult<Arc<dyn NeighborQuery>> {
        match (provider, handle) {
            (GraphStoreProvider::Embedded, GraphHandle::Embedded(store)) => {
                Ok(Arc::new(InMemoryNeighborQuery::new(store.clone())))
            }

            #[cfg(any(feature = "neo4j", feature = "memgraph"))]
            (GraphStoreProvider::Neo4j | GraphStoreProvider::Memgraph, GraphHandle::Bolt(store)) => {
                Ok(Arc::new(BoltNeighborQuery::new(store.clone())))
            }

            (GraphStoreProvider::Embedded | GraphStoreProvider::Neo4j | GraphStoreProvider::Memgraph, handle) => {
                let expected = if provider.is_bolt() { "bolt" } else { "embedded" };
                Err(LoomError::backend_mismatch(expected, handle.kind()))
            }

            (provider, _) => Err(LoomError::unsupported_provider(provider)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphloom_core::error::ErrorCode;

    #[tokio::test]
    async fn test_create_embedded() {
        let handle = GraphStoreFactory::create(&GraphStoreConfig::default())
            .await
            .unwrap();
        assert_eq!(handle.kind(), "embedded");

        let store = handle.store();
        assert!(store.lookup_nodes(&["X".to_string()]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_unsupported_provider() {
        let config = GraphStoreConfig {
            provider: GraphStoreProvider::Kuzu,
            ..Default::default()
        };
        let err = GraphStoreFactory::create(&config).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CfgUnsupportedProvider);
    }

    #[tokio::test]
    async fn test_neighbor_query_for_embedded() {
        let handle = GraphStoreFactory::create(&GraphStoreConfig::default())
            .await
            .unwrap();
        let query = GraphStoreFactory::neighbor_query(GraphStoreProvider::Embedded, &handle).unwrap();
        assert!(query.find_neighbors("X", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_neighbor_query_backend_mismatch() {
        let handle = GraphStoreFactory::create(&GraphStoreConfig::default())
            .await
            .unwrap();

        for provider in [GraphStoreProvider::Neo4j, GraphStoreProvider::Memgraph] {
            let err = GraphStoreFactory::neighbor_query(provider, &handle)
                .err()
                .unwrap();
            assert_eq!(err.code(), ErrorCode::GrpBackendMismatch);
        }
    }

    #[tokio::test]
    async fn test_neighbor_query_unsupported_provider() {
        let handle = GraphStoreFactory::create(&GraphStoreConfig::default())
            .await
            .unwrap();

        for provider in [GraphStoreProvider::Kuzu, GraphStoreProvider::Neptune] {
            let err = GraphStoreFactory::neighbor_query(provider, &handle)
                .err()
                .unwrap();
            assert_eq!(err.code(), ErrorCode::CfgUnsupportedProvider);
        }
    }
}
