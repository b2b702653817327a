//! Graph store trait and related types.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LoomError, LoomResult};
use crate::types::{GraphEdge, GraphNode};

/// Core GraphStore trait - all graph store backends implement this.
///
/// Stores only ever receive additions from the merge engine. How a store
/// treats a node or edge that already exists is up to the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Return the nodes among `ids` that already exist in the store.
    async fn lookup_nodes(&self, ids: &[String]) -> LoomResult<Vec<GraphNode>>;

    /// Add a batch of nodes.
    async fn add_nodes(&self, nodes: Vec<GraphNode>) -> LoomResult<()>;

    /// Add a batch of edges. Callers add the referenced nodes first.
    async fn add_edges(&self, edges: Vec<GraphEdge>) -> LoomResult<()>;
}

/// Graph store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStoreConfig {
    /// Provider type.
    pub provider: GraphStoreProvider,
    /// Connection URL, or database path for the embedded store.
    pub url: String,
    /// Username for authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Database name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self {
            provider: GraphStoreProvider::Embedded,
            url: ":memory:".to_string(),
            username: None,
            password: None,
            database: None,
        }
    }
}

impl GraphStoreConfig {
    /// Configuration for a Neo4j server.
    pub fn neo4j(url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            provider: GraphStoreProvider::Neo4j,
            url: url.into(),
            username: Some(username.into()),
            password: Some(password.into()),
            database: None,
        }
    }

    /// Configuration for an embedded store at `path` (`:memory:` for no persistence).
    pub fn embedded(path: impl Into<String>) -> Self {
        Self {
            provider: GraphStoreProvider::Embedded,
            url: path.into(),
            ..Default::default()
        }
    }
}

/// Graph store provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GraphStoreProvider {
    /// In-process petgraph graph persisted to SQLite.
    #[default]
    #[serde(alias = "networkx", alias = "in_memory")]
    Embedded,
    Neo4j,
    Memgraph,
    Neptune,
    Kuzu,
}

impl GraphStoreProvider {
    /// Get the provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Neo4j => "neo4j",
            Self::Memgraph => "memgraph",
            Self::Neptune => "neptune",
            Self::Kuzu => "kuzu",
        }
    }

    /// Whether the provider speaks the Bolt protocol.
    pub fn is_bolt(&self) -> bool {
        matches!(self, Self::Neo4j | Self::Memgraph)
    }
}

impl fmt::Display for GraphStoreProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphStoreProvider {
    type Err = LoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "embedded" | "networkx" | "in_memory" => Ok(Self::Embedded),
            "neo4j" => Ok(Self::Neo4j),
            "memgraph" => Ok(Self::Memgraph),
            "neptune" => Ok(Self::Neptune),
            "kuzu" => Ok(Self::Kuzu),
            other => Err(LoomError::configuration(format!(
                "Unknown graph store provider '{}'",
                other
            ))),
        }
    }
}
