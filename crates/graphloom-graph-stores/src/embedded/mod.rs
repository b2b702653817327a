//! Embedded graph store using petgraph + SQLite hybrid architecture.
//!
//! This module provides a graph store implementation that:
//! - Uses SQLite for persistent storage
//! - Uses petgraph DiGraph for in-memory lookups and ordered scans
//! - Writes each batch to SQLite in one transaction before touching the graph
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          EmbeddedGraphStore             │
//! ├─────────────────────────────────────────┤
//! │  ┌─────────────┐    ┌────────────────┐  │
//! │  │   SQLite    │    │   petgraph     │  │
//! │  │ (persistent)│◄──►│  (in-memory)   │  │
//! │  │             │    │  DiGraph       │  │
//! │  └─────────────┘    └────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```

pub mod petgraph_ops;
pub mod schema;
pub mod sync;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::Connection;

use graphloom_core::error::{LoomError, LoomResult};
use graphloom_core::traits::{GraphStore, GraphStoreConfig};
use graphloom_core::types::{Attributes, GraphEdge, GraphNode};

use petgraph_ops::GraphState;

/// Embedded graph store using petgraph + SQLite.
///
/// Thread-safe via Mutex on the connection and graph. Locks are always taken
/// connection first, then graph.
pub struct EmbeddedGraphStore {
    /// SQLite connection (wrapped in Mutex for Send + Sync).
    conn: Mutex<Connection>,
    /// In-memory graph for scans and traversal.
    graph: Mutex<GraphState>,
}

impl EmbeddedGraphStore {
    /// Create a new embedded graph store with the given database path.
    pub fn new(db_path: impl AsRef<Path>) -> LoomResult<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        schema::init_schema(&conn)?;

        // Load existing data
        let graph = sync::load_graph(&conn)?;

        tracing::info!(
            "Opened embedded graph store at {} ({} nodes, {} edges)",
            db_path.as_ref().display(),
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            conn: Mutex::new(conn),
            graph: Mutex::new(graph),
        })
    }

    /// Create a new in-memory embedded graph store.
    pub fn in_memory() -> LoomResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            graph: Mutex::new(GraphState::new()),
        })
    }

    /// Create from a GraphStoreConfig.
    pub fn from_config(config: &GraphStoreConfig) -> LoomResult<Self> {
        // URL is the database path for embedded store
        if config.url.is_empty() || config.url == ":memory:" {
            Self::in_memory()
        } else {
            Self::new(&config.url)
        }
    }

    fn lock_conn(&self) -> LoomResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| LoomError::internal(e.to_string()))
    }

    fn lock_graph(&self) -> LoomResult<MutexGuard<'_, GraphState>> {
        self.graph.lock().map_err(|e| LoomError::internal(e.to_string()))
    }

    /// Get a copy of a node's attributes.
    pub fn node_attributes(&self, id: &str) -> LoomResult<Option<Attributes>> {
        let graph = self.lock_graph()?;
        Ok(graph.node(id).map(|n| n.attributes.clone()))
    }

    /// Visit every node in insertion order.
    ///
    /// The graph stays locked for the duration of the scan.
    pub fn scan_nodes<F>(&self, mut visit: F) -> LoomResult<()>
    where
        F: FnMut(&str, &Attributes),
    {
        let graph = self.lock_graph()?;
        for node in graph.nodes() {
            visit(&node.id, &node.attributes);
        }
        Ok(())
    }

    /// Outgoing edges of a node.
    pub fn edges_from(&self, id: &str) -> LoomResult<Vec<GraphEdge>> {
        let graph = self.lock_graph()?;
        Ok(graph.edges_from(id))
    }

    /// Get node count.
    pub fn node_count(&self) -> LoomResult<usize> {
        Ok(self.lock_graph()?.node_count())
    }

    /// Get edge count.
    pub fn edge_count(&self) -> LoomResult<usize> {
        Ok(self.lock_graph()?.edge_count())
    }
}

/// Merge `update` into `base`, later keys winning.
fn merged(base: Option<&Attributes>, update: Attributes) -> Attributes {
    let mut attributes = base.cloned().unwrap_or_default();
    attributes.extend(update);
    attributes
}

#[async_trait]
impl GraphStore for EmbeddedGraphStore {
    async fn lookup_nodes(&self, ids: &[String]) -> LoomResult<Vec<GraphNode>> {
        let graph = self.lock_graph()?;
        Ok(ids
            .iter()
            .filter_map(|id| graph.node(id))
            .map(|n| GraphNode::new(n.id.clone(), n.attributes.clone()))
            .collect())
    }

    /// Upsert nodes; attributes of existing nodes are updated key by key.
    async fn add_nodes(&self, nodes: Vec<GraphNode>) -> LoomResult<()> {
        let mut conn = self.lock_conn()?;
        let mut graph = self.lock_graph()?;

        // Resolve the final attributes of every touched node first so the
        // graph is only modified once the transaction has committed.
        let mut order: Vec<String> = Vec::new();
        let mut pending: HashMap<String, Attributes> = HashMap::new();
        for node in nodes {
            let base = pending
                .get(&node.id)
                .or_else(|| graph.node(&node.id).map(|n| &n.attributes));
            let attributes = merged(base, node.attributes);
            if !pending.contains_key(&node.id) {
                order.push(node.id.clone());
            }
            pending.insert(node.id, attributes);
        }

        let tx = conn.transaction()?;
        for id in &order {
            sync::save_node(&tx, id, &pending[id])?;
        }
        tx.commit()?;

        for id in &order {
            if let Some(attributes) = pending.remove(id) {
                graph.upsert_node(id, attributes);
            }
        }

        tracing::debug!("Added {} nodes to embedded graph store", order.len());
        Ok(())
    }

    /// Upsert edges, creating placeholder nodes for unknown endpoints.
    async fn add_edges(&self, edges: Vec<GraphEdge>) -> LoomResult<()> {
        let mut conn = self.lock_conn()?;
        let mut graph = self.lock_graph()?;

        let mut placeholders: Vec<String> = Vec::new();
        let mut seen_placeholders: HashSet<String> = HashSet::new();
        let mut order: Vec<(String, String, String)> = Vec::new();
        let mut pending: HashMap<(String, String, String), Attributes> = HashMap::new();

        for edge in edges {
            for endpoint in [&edge.source_id, &edge.target_id] {
                if !graph.contains(endpoint) && seen_placeholders.insert(endpoint.clone()) {
                    placeholders.push(endpoint.clone());
                }
            }

            let key = (edge.source_id, edge.target_id, edge.relationship_name);
            let base = pending
                .get(&key)
                .or_else(|| graph.edge_attributes(&key.0, &key.1, &key.2));
            let attributes = merged(base, edge.attributes);
            if !pending.contains_key(&key) {
                order.push(key.clone());
            }
            pending.insert(key, attributes);
        }

        let tx = conn.transaction()?;
        for id in &placeholders {
            sync::save_placeholder_node(&tx, id)?;
        }
        for key in &order {
            sync::save_edge(&tx, &key.0, &key.1, &key.2, &pending[key])?;
        }
        tx.commit()?;

        for key in &order {
            if let Some(attributes) = pending.remove(key) {
                graph.upsert_edge(&key.0, &key.1, &key.2, attributes);
            }
        }

        tracing::debug!(
            "Added {} edges ({} placeholder nodes) to embedded graph store",
            order.len(),
            placeholders.len()
        );
        Ok(())
    }
}

// Implement Debug for EmbeddedGraphStore
impl std::fmt::Debug for EmbeddedGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedGraphStore")
            .field("node_count", &self.node_count().unwrap_or(0))
            .field("edge_count", &self.edge_count().unwrap_or(0))
            .finish()
    }
}
