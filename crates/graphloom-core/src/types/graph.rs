//! Raw extraction output and canonical graph records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute payload of a node or edge.
pub type Attributes = serde_json::Map<String, Value>;

/// Relationship from a chunk to an entity it mentions.
pub const CONTAINS: &str = "contains";
/// Relationship from a chunk to the type of an entity it mentions.
pub const CONTAINS_ENTITY_TYPE: &str = "contains_entity_type";
/// Relationship from a type node to one of its entities.
pub const IS_ENTITY_TYPE: &str = "is_entity_type";

/// Timestamp layout used for `created_at` / `updated_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An entity as returned by extraction, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Free-text identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text entity category.
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Description of the entity.
    #[serde(default)]
    pub description: String,
}

impl RawNode {
    /// Create a raw node whose id and name are the same text.
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            entity_type: entity_type.into(),
            description: description.into(),
        }
    }
}

/// A relationship as returned by extraction, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    pub source_node_id: String,
    pub target_node_id: String,
    pub relationship_name: String,
}

impl RawEdge {
    /// Create a raw edge.
    pub fn new(
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
        relationship_name: impl Into<String>,
    ) -> Self {
        Self {
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
            relationship_name: relationship_name.into(),
        }
    }
}

/// The graph extracted from a single chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

impl ChunkGraph {
    /// Check if the graph has neither nodes nor edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// A node as stored in a graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Canonical identifier.
    pub id: String,
    /// Node attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

impl GraphNode {
    /// Create a node with the given attributes.
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Get a string attribute.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// An edge as stored in a graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source_id: String,
    pub target_id: String,
    pub relationship_name: String,
    /// Edge attributes; repeats the triple.
    #[serde(default)]
    pub attributes: Attributes,
}

impl GraphEdge {
    /// Create an edge whose attributes repeat the (source, target, label) triple.
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_name: impl Into<String>,
    ) -> Self {
        let source_id = source_id.into();
        let target_id = target_id.into();
        let relationship_name = relationship_name.into();

        let mut attributes = Attributes::new();
        attributes.insert(
            "relationship_name".to_string(),
            Value::String(relationship_name.clone()),
        );
        attributes.insert("source_node_id".to_string(), Value::String(source_id.clone()));
        attributes.insert("target_node_id".to_string(), Value::String(target_id.clone()));

        Self {
            source_id,
            target_id,
            relationship_name,
            attributes,
        }
    }
}

/// Canonical entity node produced by the merge engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNode {
    pub id: String,
    pub chunk_id: String,
    pub document_id: String,
    pub name: String,
    /// Title-cased entity category.
    #[serde(rename = "type")]
    pub entity_type: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Canonical type node; one per entity category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeNode {
    pub id: String,
    pub name: String,
    /// Always equal to `name`.
    #[serde(rename = "type")]
    pub entity_type: String,
    pub created_at: String,
    pub updated_at: String,
}

fn string_attrs<const N: usize>(pairs: [(&str, String); N]) -> Attributes {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v)))
        .collect()
}

impl From<EntityNode> for GraphNode {
    fn from(node: EntityNode) -> Self {
        let id = node.id.clone();
        let attributes = string_attrs([
            ("id", node.id),
            ("chunk_id", node.chunk_id),
            ("document_id", node.document_id),
            ("name", node.name),
            ("type", node.entity_type),
            ("description", node.description),
            ("created_at", node.created_at),
            ("updated_at", node.updated_at),
        ]);
        GraphNode { id, attributes }
    }
}

impl From<TypeNode> for GraphNode {
    fn from(node: TypeNode) -> Self {
        let id = node.id.clone();
        let attributes = string_attrs([
            ("id", node.id),
            ("name", node.name),
            ("type", node.entity_type),
            ("created_at", node.created_at),
            ("updated_at", node.updated_at),
        ]);
        GraphNode { id, attributes }
    }
}
