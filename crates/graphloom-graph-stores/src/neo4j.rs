//! Bolt graph store implementation.
//! Works against Neo4j and Memgraph, which share the protocol.

use std::collections::HashMap;

use async_trait::async_trait;
use neo4rs::{query, BoltType, ConfigBuilder, Graph, Query};
use serde_json::Value;

use graphloom_core::error::{LoomError, LoomResult};
use graphloom_core::traits::{GraphStore, GraphStoreConfig, GraphStoreProvider};
use graphloom_core::types::{Attributes, GraphEdge, GraphNode};

/// Graph store speaking Bolt through `neo4rs`.
///
/// Edge labels are free text, so every edge uses the `RELATED` relationship
/// type and keeps its label in the `relationship_name` property.
pub struct Neo4jGraphStore {
    graph: Graph,
    provider: GraphStoreProvider,
}

impl Neo4jGraphStore {
    /// Connect to the server described by `config`.
    pub async fn new(config: GraphStoreConfig) -> LoomResult<Self> {
        let default_user = match config.provider {
            GraphStoreProvider::Memgraph => "memgraph",
            _ => "neo4j",
        };
        let username = config.username.clone().unwrap_or_else(|| default_user.to_string());
        let password = config.password.clone().unwrap_or_default();

        let mut builder = ConfigBuilder::default()
            .uri(config.url.as_str())
            .user(username.as_str())
            .password(password.as_str());
        if let Some(database) = config.database.as_deref() {
            builder = builder.db(database);
        }
        let bolt_config = builder
            .build()
            .map_err(|e| LoomError::configuration(format!("Invalid Bolt configuration: {}", e)))?;

        let graph = Graph::connect(bolt_config).await.map_err(|e| {
            LoomError::graph_connection(format!(
                "Failed to connect to {} at {}: {}",
                config.provider, config.url, e
            ))
        })?;

        tracing::info!("Connected to {} graph store at {}", config.provider, config.url);

        Ok(Self {
            graph,
            provider: config.provider,
        })
    }

    /// The underlying connection pool.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Backend this store was opened for.
    pub fn provider(&self) -> GraphStoreProvider {
        self.provider
    }

    /// Run a read query and collect one string column.
    ///
    /// Rows where the column is missing or not a string are skipped.
    pub async fn fetch_strings(
        &self,
        cypher: &str,
        params: &[(&str, String)],
        column: &str,
    ) -> LoomResult<Vec<String>> {
        let q = params
            .iter()
            .fold(query(cypher), |q, (key, value)| q.param(key, value.clone()));

        let mut result = self
            .graph
            .execute(q)
            .await
            .map_err(|e| LoomError::graph_store(format!("Failed to run query: {}", e)))?;

        let mut values = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| LoomError::graph_store(format!("Failed to fetch row: {}", e)))?
        {
            values.extend(row.get::<String>(column).ok());
        }

        Ok(values)
    }

    async fn run(&self, q: Query, action: &str) -> LoomResult<()> {
        self.graph
            .run(q)
            .await
            .map_err(|e| LoomError::graph_store(format!("Failed to {}: {}", action, e)))
    }
}

/// Convert JSON attributes into a Bolt property map.
///
/// Scalars map directly, arrays and objects are stored as JSON text, nulls
/// are dropped.
pub(crate) fn to_bolt_properties(attributes: &Attributes) -> HashMap<String, BoltType> {
    attributes
        .iter()
        .filter_map(|(key, value)| {
            let bolt = match value {
                Value::Null => return None,
                Value::Bool(b) => BoltType::from(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => BoltType::from(i),
                    None => BoltType::from(n.as_f64().unwrap_or_default()),
                },
                Value::String(s) => BoltType::from(s.clone()),
                nested => BoltType::from(nested.to_string()),
            };
            Some((key.clone(), bolt))
        })
        .collect()
}

/// Convert a Bolt value read back from the server into JSON.
pub(crate) fn from_bolt(value: BoltType) -> Value {
    match value {
        BoltType::String(s) => Value::String(s.value),
        BoltType::Boolean(b) => Value::Bool(b.value),
        BoltType::Integer(i) => Value::from(i.value),
        BoltType::Float(f) => serde_json::Number::from_f64(f.value)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        BoltType::List(list) => Value::Array(list.value.into_iter().map(from_bolt).collect()),
        BoltType::Map(map) => Value::Object(
            map.value
                .into_iter()
                .map(|(k, v)| (k.value, from_bolt(v)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn lookup_nodes(&self, ids: &[String]) -> LoomResult<Vec<GraphNode>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let q = query(
            r#"
            MATCH (n)
            WHERE n.id IN $ids
            RETURN n.id AS id, properties(n) AS properties
            "#,
        )
        .param("ids", ids.to_vec());

        let mut result = self
            .graph
            .execute(q)
            .await
            .map_err(|e| LoomError::graph_store(format!("Failed to look up nodes: {}", e)))?;

        let mut nodes = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| LoomError::graph_store(format!("Failed to fetch row: {}", e)))?
        {
            let Ok(id) = row.get::<String>("id") else {
                continue;
            };
            let attributes = match row.get::<BoltType>("properties").map(from_bolt) {
                Ok(Value::Object(map)) => map,
                _ => Attributes::new(),
            };
            nodes.push(GraphNode::new(id, attributes));
        }

        Ok(nodes)
    }

    async fn add_nodes(&self, nodes: Vec<GraphNode>) -> LoomResult<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        let count = nodes.len();

        let rows: Vec<HashMap<String, BoltType>> = nodes
            .iter()
            .map(|node| {
                HashMap::from([
                    ("id".to_string(), BoltType::from(node.id.clone())),
                    (
                        "properties".to_string(),
                        BoltType::from(to_bolt_properties(&node.attributes)),
                    ),
                ])
            })
            .collect();

        let q = query(
            r#"
            UNWIND $nodes AS node
            MERGE (n {id: node.id})
            SET n += node.properties
            "#,
        )
        .param("nodes", rows);

        self.run(q, "add nodes").await?;
        tracing::debug!("Added {} nodes to {} graph store", count, self.provider);
        Ok(())
    }

    async fn add_edges(&self, edges: Vec<GraphEdge>) -> LoomResult<()> {
        if edges.is_empty() {
            return Ok(());
        }
        let count = edges.len();

        let rows: Vec<HashMap<String, BoltType>> = edges
            .iter()
            .map(|edge| {
                HashMap::from([
                    ("source".to_string(), BoltType::from(edge.source_id.clone())),
                    ("target".to_string(), BoltType::from(edge.target_id.clone())),
                    (
                        "relationship_name".to_string(),
                        BoltType::from(edge.relationship_name.clone()),
                    ),
                    (
                        "properties".to_string(),
                        BoltType::from(to_bolt_properties(&edge.attributes)),
                    ),
                ])
            })
            .collect();

        let q = query(
            r#"
            UNWIND $edges AS edge
            MERGE (s {id: edge.source})
            MERGE (t {id: edge.target})
            MERGE (s)-[r:RELATED {relationship_name: edge.relationship_name}]->(t)
            SET r += edge.properties
            "#,
        )
        .param("edges", rows);

        self.run(q, "add edges").await?;
        tracing::debug!("Added {} edges to {} graph store", count, self.provider);
        Ok(())
    }
}

impl std::fmt::Debug for Neo4jGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jGraphStore")
            .field("provider", &self.provider)
            .finish()
    }
}
