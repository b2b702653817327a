//! In-memory graph operations using petgraph DiGraph.
//!
//! Nodes are addressed by their canonical string id through a side index.
//! Nodes are never removed, so `node_indices()` order is insertion order.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use graphloom_core::types::{Attributes, GraphEdge};

/// Node data in the graph.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Canonical node id.
    pub id: String,
    /// Node attributes.
    pub attributes: Attributes,
}

/// Edge data in the graph.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Relationship label.
    pub relationship_name: String,
    /// Edge attributes.
    pub attributes: Attributes,
}

/// The in-memory graph type using petgraph.
pub type KnowledgeGraph = DiGraph<NodeData, EdgeData>;

/// Graph plus id index.
#[derive(Debug, Default)]
pub struct GraphState {
    graph: KnowledgeGraph,
    index: HashMap<String, NodeIndex>,
}

impl GraphState {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or replace the attributes of an existing one in place.
    pub fn upsert_node(&mut self, id: &str, attributes: Attributes) -> NodeIndex {
        match self.index.get(id) {
            Some(&idx) => {
                self.graph[idx].attributes = attributes;
                idx
            }
            None => {
                let idx = self.graph.add_node(NodeData {
                    id: id.to_string(),
                    attributes,
                });
                self.index.insert(id.to_string(), idx);
                idx
            }
        }
    }

    /// Insert an edge, or replace the attributes of the edge with the same label.
    ///
    /// Missing endpoints are created with empty attributes.
    pub fn upsert_edge(
        &mut self,
        source_id: &str,
        target_id: &str,
        relationship_name: &str,
        attributes: Attributes,
    ) {
        let source = self.ensure_node(source_id);
        let target = self.ensure_node(target_id);

        let existing = self
            .graph
            .edges_connecting(source, target)
            .find(|e| e.weight().relationship_name == relationship_name)
            .map(|e| e.id());

        match existing {
            Some(edge_idx) => self.graph[edge_idx].attributes = attributes,
            None => {
                self.graph.add_edge(
                    source,
                    target,
                    EdgeData {
                        relationship_name: relationship_name.to_string(),
                        attributes,
                    },
                );
            }
        }
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        match self.index.get(id) {
            Some(&idx) => idx,
            None => self.upsert_node(id, Attributes::new()),
        }
    }

    /// Whether a node with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Get a node by id.
    pub fn node(&self, id: &str) -> Option<&NodeData> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Get the attributes of the edge `(source, target, relationship_name)`.
    pub fn edge_attributes(
        &self,
        source_id: &str,
        target_id: &str,
        relationship_name: &str,
    ) -> Option<&Attributes> {
        let source = *self.index.get(source_id)?;
        let target = *self.index.get(target_id)?;
        self.graph
            .edges_connecting(source, target)
            .find(|e| e.weight().relationship_name == relationship_name)
            .map(|e| &e.weight().attributes)
    }

    /// Iterate nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Outgoing edges of a node, in insertion order.
    pub fn edges_from(&self, id: &str) -> Vec<GraphEdge> {
        let Some(&idx) = self.index.get(id) else {
            return vec![];
        };

        let mut edges: Vec<_> = self.graph.edges(idx).collect();
        // petgraph walks adjacency lists newest first
        edges.sort_by_key(|e| e.id());

        edges
            .into_iter()
            .map(|e| GraphEdge {
                source_id: id.to_string(),
                target_id: self.graph[e.target()].id.clone(),
                relationship_name: e.weight().relationship_name.clone(),
                attributes: e.weight().attributes.clone(),
            })
            .collect()
    }

    /// Get the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
