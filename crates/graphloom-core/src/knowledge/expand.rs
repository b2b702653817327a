//! Knowledge graph expansion from document chunks.
//!
//! Each chunk is extracted independently and concurrently. The resulting raw
//! graphs are then merged into canonical nodes and edges:
//!
//! 1. Every raw node becomes an entity node keyed by its normalized id,
//!    linked from its chunk with a `contains` edge.
//! 2. Every distinct entity type gets one type node, unless the store or an
//!    earlier node in the same batch already provided it. Chunks and entities
//!    are linked to it with `contains_entity_type` and `is_entity_type` edges.
//! 3. Every raw edge becomes a canonical edge between normalized endpoints.
//!
//! The batch is committed at the end, nodes first, then edges.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::stream::{self, StreamExt};

use crate::config::ExpandConfig;
use crate::error::LoomResult;
use crate::traits::{ExtractionSchema, Extractor, GraphStore};
use crate::types::{
    Chunk, ChunkGraph, EntityNode, GraphEdge, GraphNode, TypeNode, CONTAINS,
    CONTAINS_ENTITY_TYPE, IS_ENTITY_TYPE, TIMESTAMP_FORMAT,
};

use super::identity::{display_type, normalize_id};
use super::registry::TypeRegistry;

/// Canonical nodes and edges produced by one merge pass.
#[derive(Debug, Clone, Default)]
pub struct GraphBatch {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphBatch {
    /// Check if the batch carries nothing.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Builds the knowledge graph for batches of chunks.
pub struct GraphExpander {
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn GraphStore>,
    config: ExpandConfig,
}

impl GraphExpander {
    /// Create an expander with unbounded extraction fan-out.
    pub fn new(extractor: Arc<dyn Extractor>, store: Arc<dyn GraphStore>) -> Self {
        Self::with_config(extractor, store, ExpandConfig::default())
    }

    /// Create an expander with explicit settings.
    pub fn with_config(
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn GraphStore>,
        config: ExpandConfig,
    ) -> Self {
        Self {
            extractor,
            store,
            config,
        }
    }

    /// Extract, merge and commit the graph for `chunks`, handing the chunks back.
    ///
    /// A chunk whose extraction fails or yields nothing is skipped. Store
    /// errors abort the call; nothing is written before the final node batch.
    pub async fn expand(
        &self,
        chunks: Vec<Chunk>,
        schema: &ExtractionSchema,
    ) -> LoomResult<Vec<Chunk>> {
        let graphs = self.extract_all(&chunks, schema).await;

        let registry = TypeRegistry::seed(self.store.as_ref(), graphs.iter().flatten()).await?;
        let (batch, _) = synthesize(&chunks, &graphs, registry, Utc::now());

        tracing::debug!(
            "Expanding {} chunks ({} extracted) into {} nodes and {} edges",
            chunks.len(),
            graphs.iter().filter(|g| g.is_some()).count(),
            batch.nodes.len(),
            batch.edges.len()
        );

        self.store.add_nodes(batch.nodes).await?;
        self.store.add_edges(batch.edges).await?;

        Ok(chunks)
    }

    /// Run extraction for every chunk, keeping chunk order.
    async fn extract_all(
        &self,
        chunks: &[Chunk],
        schema: &ExtractionSchema,
    ) -> Vec<Option<ChunkGraph>> {
        let extractions = chunks.iter().map(|chunk| self.extract_chunk(chunk, schema));

        match self.config.extraction_concurrency {
            Some(limit) => stream::iter(extractions).buffered(limit.max(1)).collect().await,
            None => join_all(extractions).await,
        }
    }

    async fn extract_chunk(&self, chunk: &Chunk, schema: &ExtractionSchema) -> Option<ChunkGraph> {
        match self.extractor.extract(&chunk.text, schema).await {
            Ok(Some(graph)) => Some(graph),
            Ok(None) => {
                tracing::debug!("No graph extracted from chunk {}", chunk.chunk_id);
                None
            }
            Err(e) => {
                tracing::warn!("Extraction failed for chunk {}: {}", chunk.chunk_id, e);
                None
            }
        }
    }
}

/// Merge per-chunk graphs into canonical nodes and edges.
///
/// `graphs[i]` belongs to `chunks[i]`; `None` entries contribute nothing.
/// Type nodes are only created for ids missing from `registry`, which is
/// returned with the new type nodes added.
pub fn synthesize(
    chunks: &[Chunk],
    graphs: &[Option<ChunkGraph>],
    mut registry: TypeRegistry,
    now: DateTime<Utc>,
) -> (GraphBatch, TypeRegistry) {
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    let mut batch = GraphBatch::default();

    let extracted: Vec<(&Chunk, &ChunkGraph)> = chunks
        .iter()
        .zip(graphs)
        .filter_map(|(chunk, graph)| graph.as_ref().map(|g| (chunk, g)))
        .collect();

    for (chunk, graph) in &extracted {
        let chunk_id = chunk.chunk_id.to_string();

        for node in &graph.nodes {
            let node_id = normalize_id(&node.id);
            let type_name = display_type(&node.entity_type);

            batch.nodes.push(
                EntityNode {
                    id: node_id.clone(),
                    chunk_id: chunk_id.clone(),
                    document_id: chunk.document_id.to_string(),
                    name: node.name.clone(),
                    entity_type: type_name.clone(),
                    description: node.description.clone(),
                    created_at: timestamp.clone(),
                    updated_at: timestamp.clone(),
                }
                .into(),
            );
            batch.edges.push(GraphEdge::new(&chunk_id, &node_id, CONTAINS));

            let type_id = normalize_id(&node.entity_type);
            if !registry.contains(&type_id) {
                let type_node: GraphNode = TypeNode {
                    id: type_id.clone(),
                    name: type_name.clone(),
                    entity_type: type_name,
                    created_at: timestamp.clone(),
                    updated_at: timestamp.clone(),
                }
                .into();
                batch.nodes.push(type_node.clone());
                registry.register(type_node);
            }

            batch.edges.push(GraphEdge::new(&chunk_id, &type_id, CONTAINS_ENTITY_TYPE));
            // "Jake is a Person"
            batch.edges.push(GraphEdge::new(&type_id, &node_id, IS_ENTITY_TYPE));
        }
    }

    for (_, graph) in &extracted {
        for edge in &graph.edges {
            batch.edges.push(GraphEdge::new(
                normalize_id(&edge.source_node_id),
                normalize_id(&edge.target_node_id),
                edge.relationship_name.clone(),
            ));
        }
    }

    (batch, registry)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::error::LoomError;
    use crate::traits::{MockExtractor, MockGraphStore};
    use crate::types::{Attributes, RawEdge, RawNode};

    /// Records every store call in order.
    #[derive(Default)]
    struct RecordingStore {
        existing: Vec<GraphNode>,
        calls: Mutex<Vec<&'static str>>,
        nodes: Mutex<Vec<GraphNode>>,
        edges: Mutex<Vec<GraphEdge>>,
    }

    #[async_trait]
    impl GraphStore for RecordingStore {
        async fn lookup_nodes(&self, ids: &[String]) -> LoomResult<Vec<GraphNode>> {
            self.calls.lock().unwrap().push("lookup_nodes");
            Ok(self
                .existing
                .iter()
                .filter(|n| ids.contains(&n.id))
                .cloned()
                .collect())
        }

        async fn add_nodes(&self, nodes: Vec<GraphNode>) -> LoomResult<()> {
            self.calls.lock().unwrap().push("add_nodes");
            self.nodes.lock().unwrap().extend(nodes);
            Ok(())
        }

        async fn add_edges(&self, edges: Vec<GraphEdge>) -> LoomResult<()> {
            self.calls.lock().unwrap().push("add_edges");
            self.edges.lock().unwrap().extend(edges);
            Ok(())
        }
    }

    /// Returns a canned graph per chunk text; unknown texts yield nothing.
    struct CannedExtractor {
        graphs: HashMap<String, LoomResult<Option<ChunkGraph>>>,
    }

    impl CannedExtractor {
        fn new(entries: Vec<(&str, LoomResult<Option<ChunkGraph>>)>) -> Self {
            Self {
                graphs: entries
                    .into_iter()
                    .map(|(text, graph)| (text.to_string(), graph))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl Extractor for CannedExtractor {
        async fn extract(
            &self,
            text: &str,
            _schema: &ExtractionSchema,
        ) -> LoomResult<Option<ChunkGraph>> {
            match self.graphs.get(text) {
                Some(Ok(graph)) => Ok(graph.clone()),
                Some(Err(e)) => Err(LoomError::llm(e.to_string())),
                None => Ok(None),
            }
        }
    }

    fn chunk(text: &str) -> Chunk {
        Chunk::new(Uuid::new_v4(), text)
    }

    fn jake_graph() -> ChunkGraph {
        ChunkGraph {
            nodes: vec![RawNode::new("jake", "person", "A person named Jake")],
            edges: vec![],
        }
    }

    fn edges_named<'a>(edges: &'a [GraphEdge], name: &str) -> Vec<&'a GraphEdge> {
        edges.iter().filter(|e| e.relationship_name == name).collect()
    }

    #[test]
    fn test_synthesize_entity_node_attributes() {
        let chunks = vec![chunk("one")];
        let graphs = vec![Some(ChunkGraph {
            nodes: vec![RawNode {
                id: "Acme Corp".to_string(),
                name: "Acme Corp".to_string(),
                entity_type: "ORGANIZATION".to_string(),
                description: "A company".to_string(),
            }],
            edges: vec![],
        })];

        let (batch, _) = synthesize(&chunks, &graphs, TypeRegistry::new(), Utc::now());

        let entity = &batch.nodes[0];
        assert_eq!(entity.id, "ACME_CORP");
        assert_eq!(entity.attr_str("name"), Some("Acme Corp"));
        assert_eq!(entity.attr_str("type"), Some("Organization"));
        assert_eq!(entity.attr_str("description"), Some("A company"));
        let chunk_id = chunks[0].chunk_id.to_string();
        let document_id = chunks[0].document_id.to_string();
        assert_eq!(entity.attr_str("chunk_id"), Some(chunk_id.as_str()));
        assert_eq!(entity.attr_str("document_id"), Some(document_id.as_str()));
        assert_eq!(entity.attr_str("created_at"), entity.attr_str("updated_at"));

        let type_node = &batch.nodes[1];
        assert_eq!(type_node.id, "ORGANIZATION");
        assert_eq!(type_node.attr_str("name"), Some("Organization"));
        assert_eq!(type_node.attr_str("type"), Some("Organization"));
    }

    #[test]
    fn test_synthesize_shared_type_creates_one_type_node() {
        let chunks = vec![chunk("one"), chunk("two")];
        let graphs = vec![Some(jake_graph()), Some(jake_graph())];

        let (batch, registry) = synthesize(&chunks, &graphs, TypeRegistry::new(), Utc::now());

        let type_nodes: Vec<_> = batch.nodes.iter().filter(|n| n.id == "PERSON").collect();
        assert_eq!(type_nodes.len(), 1);
        assert!(registry.contains("PERSON"));

        let is_type = edges_named(&batch.edges, IS_ENTITY_TYPE);
        assert_eq!(is_type.len(), 2);
        assert!(is_type.iter().all(|e| e.source_id == "PERSON" && e.target_id == "JAKE"));
        assert_eq!(edges_named(&batch.edges, CONTAINS_ENTITY_TYPE).len(), 2);
    }

    #[test]
    fn test_synthesize_skips_known_type_nodes() {
        let chunks = vec![chunk("one")];
        let graphs = vec![Some(jake_graph())];
        let registry = TypeRegistry::from_nodes(vec![GraphNode::new("PERSON", Attributes::new())]);

        let (batch, _) = synthesize(&chunks, &graphs, registry, Utc::now());

        assert_eq!(batch.nodes.len(), 1);
        assert_eq!(batch.nodes[0].id, "JAKE");
        // Type edges are emitted for pre-existing type nodes too.
        assert_eq!(edges_named(&batch.edges, CONTAINS_ENTITY_TYPE).len(), 1);
        assert_eq!(edges_named(&batch.edges, IS_ENTITY_TYPE).len(), 1);
    }

    #[test]
    fn test_synthesize_one_contains_and_is_type_edge_per_entity() {
        let chunks = vec![chunk("one"), chunk("two")];
        let graphs = vec![
            Some(ChunkGraph {
                nodes: vec![
                    RawNode::new("Jake", "person", ""),
                    RawNode::new("Acme Corp", "organization", ""),
                ],
                edges: vec![],
            }),
            Some(ChunkGraph {
                nodes: vec![RawNode::new("Berlin", "city", "")],
                edges: vec![],
            }),
        ];

        let (batch, _) = synthesize(&chunks, &graphs, TypeRegistry::new(), Utc::now());

        let entities: Vec<_> = batch
            .nodes
            .iter()
            .filter(|n| n.attributes.contains_key("chunk_id"))
            .collect();
        assert_eq!(entities.len(), 3);

        for entity in entities {
            let chunk_id = entity.attr_str("chunk_id").unwrap();
            let contains: Vec<_> = edges_named(&batch.edges, CONTAINS)
                .into_iter()
                .filter(|e| e.target_id == entity.id && e.source_id == chunk_id)
                .collect();
            assert_eq!(contains.len(), 1, "contains edges for {}", entity.id);

            let is_type: Vec<_> = edges_named(&batch.edges, IS_ENTITY_TYPE)
                .into_iter()
                .filter(|e| e.target_id == entity.id)
                .collect();
            assert_eq!(is_type.len(), 1, "is_entity_type edges for {}", entity.id);
        }
    }

    #[test]
    fn test_synthesize_type_nodes_bounded_by_distinct_types() {
        let chunks = vec![chunk("one"), chunk("two")];
        let graphs = vec![
            Some(ChunkGraph {
                nodes: vec![
                    RawNode::new("a", "person", ""),
                    RawNode::new("b", "Person", ""),
                    RawNode::new("c", "big city", ""),
                ],
                edges: vec![],
            }),
            Some(ChunkGraph {
                nodes: vec![RawNode::new("d", "BIG CITY", ""), RawNode::new("e", "person", "")],
                edges: vec![],
            }),
        ];

        let (batch, _) = synthesize(&chunks, &graphs, TypeRegistry::new(), Utc::now());

        let type_nodes: Vec<_> = batch
            .nodes
            .iter()
            .filter(|n| !n.attributes.contains_key("chunk_id"))
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(type_nodes, vec!["PERSON", "BIG_CITY"]);
    }

    #[test]
    fn test_synthesize_normalizes_edge_endpoints() {
        let chunks = vec![chunk("one")];
        let graphs = vec![Some(ChunkGraph {
            nodes: vec![
                RawNode::new("Jake", "person", ""),
                RawNode::new("Acme Corp", "organization", ""),
            ],
            edges: vec![RawEdge::new("Jake", "Acme Corp", "works_at")],
        })];

        let (batch, _) = synthesize(&chunks, &graphs, TypeRegistry::new(), Utc::now());

        let works_at = edges_named(&batch.edges, "works_at");
        assert_eq!(works_at.len(), 1);
        assert_eq!(works_at[0].source_id, "JAKE");
        assert_eq!(works_at[0].target_id, "ACME_CORP");
        assert_eq!(works_at[0].attributes["source_node_id"], "JAKE");
        assert_eq!(works_at[0].attributes["target_node_id"], "ACME_CORP");
    }

    #[test]
    fn test_synthesize_null_graph_contributes_nothing() {
        let chunks = vec![chunk("one"), chunk("two")];
        let (with_null, _) = synthesize(
            &chunks,
            &[Some(jake_graph()), None],
            TypeRegistry::new(),
            Utc::now(),
        );
        let (single, _) = synthesize(&chunks[..1], &[Some(jake_graph())], TypeRegistry::new(), Utc::now());

        assert_eq!(with_null.nodes.len(), single.nodes.len());
        assert_eq!(with_null.edges.len(), single.edges.len());
        let skipped = chunks[1].chunk_id.to_string();
        assert!(with_null.edges.iter().all(|e| e.source_id != skipped));
    }

    #[tokio::test]
    async fn test_expand_two_chunks_same_entity() {
        let chunks = vec![chunk("first"), chunk("second")];
        let extractor = CannedExtractor::new(vec![
            ("first", Ok(Some(jake_graph()))),
            ("second", Ok(Some(jake_graph()))),
        ]);
        let store = Arc::new(RecordingStore::default());
        let expander = GraphExpander::new(Arc::new(extractor), store.clone());

        let returned = expander
            .expand(chunks.clone(), &ExtractionSchema::default())
            .await
            .unwrap();
        assert_eq!(returned, chunks);

        let nodes = store.nodes.lock().unwrap();
        assert_eq!(nodes.iter().filter(|n| n.id == "PERSON").count(), 1);

        let edges = store.edges.lock().unwrap();
        let is_type = edges_named(&edges, IS_ENTITY_TYPE);
        assert_eq!(is_type.len(), 2);

        // One entity record per chunk; the ids collide by design.
        let entity_chunks: Vec<_> = nodes
            .iter()
            .filter(|n| n.id == "JAKE")
            .filter_map(|n| n.attr_str("chunk_id"))
            .collect();
        assert_eq!(entity_chunks.len(), 2);
        assert_ne!(entity_chunks[0], entity_chunks[1]);
    }

    #[tokio::test]
    async fn test_expand_null_extraction_passes_chunks_through() {
        let chunks = vec![chunk("first"), chunk("second")];
        let extractor = CannedExtractor::new(vec![
            ("first", Ok(Some(jake_graph()))),
            ("second", Ok(None)),
        ]);
        let store = Arc::new(RecordingStore::default());
        let expander = GraphExpander::new(Arc::new(extractor), store.clone());

        let returned = expander
            .expand(chunks.clone(), &ExtractionSchema::default())
            .await
            .unwrap();
        assert_eq!(returned, chunks);

        let second = chunks[1].chunk_id.to_string();
        let nodes = store.nodes.lock().unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.attr_str("chunk_id") != Some(second.as_str())));
        let edges = store.edges.lock().unwrap();
        assert!(edges.iter().all(|e| e.source_id != second));
    }

    #[tokio::test]
    async fn test_expand_extraction_error_is_not_fatal() {
        let chunks = vec![chunk("broken"), chunk("fine")];
        let extractor = CannedExtractor::new(vec![
            ("broken", Err(LoomError::llm("model timed out"))),
            ("fine", Ok(Some(jake_graph()))),
        ]);
        let store = Arc::new(RecordingStore::default());
        let expander = GraphExpander::new(Arc::new(extractor), store.clone());

        expander
            .expand(chunks, &ExtractionSchema::default())
            .await
            .unwrap();

        assert_eq!(store.nodes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_expand_reuses_existing_type_nodes() {
        let store = Arc::new(RecordingStore {
            existing: vec![GraphNode::new("PERSON", Attributes::new())],
            ..Default::default()
        });
        let extractor = CannedExtractor::new(vec![("first", Ok(Some(jake_graph())))]);
        let expander = GraphExpander::new(Arc::new(extractor), store.clone());

        expander
            .expand(vec![chunk("first")], &ExtractionSchema::default())
            .await
            .unwrap();

        let nodes = store.nodes.lock().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "JAKE");
    }

    #[tokio::test]
    async fn test_expand_commits_nodes_before_edges() {
        let store = Arc::new(RecordingStore::default());
        let extractor = CannedExtractor::new(vec![("first", Ok(Some(jake_graph())))]);
        let expander = GraphExpander::new(Arc::new(extractor), store.clone());

        expander
            .expand(vec![chunk("first")], &ExtractionSchema::default())
            .await
            .unwrap();

        assert_eq!(
            *store.calls.lock().unwrap(),
            vec!["lookup_nodes", "add_nodes", "add_edges"]
        );
    }

    #[tokio::test]
    async fn test_expand_bounded_concurrency_keeps_chunk_order() {
        let chunks: Vec<Chunk> = (0..5).map(|i| chunk(&format!("chunk {}", i))).collect();
        let extractor = CannedExtractor::new(
            chunks
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let graph = ChunkGraph {
                        nodes: vec![RawNode::new(format!("entity {}", i), "thing", "")],
                        edges: vec![],
                    };
                    (c.text.as_str(), Ok(Some(graph)))
                })
                .collect(),
        );
        let store = Arc::new(RecordingStore::default());
        let expander = GraphExpander::with_config(
            Arc::new(extractor),
            store.clone(),
            ExpandConfig {
                extraction_concurrency: Some(2),
            },
        );

        expander
            .expand(chunks.clone(), &ExtractionSchema::default())
            .await
            .unwrap();

        let entity_ids: Vec<String> = store
            .nodes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.id != "THING")
            .map(|n| n.id.clone())
            .collect();
        assert_eq!(
            entity_ids,
            vec!["ENTITY_0", "ENTITY_1", "ENTITY_2", "ENTITY_3", "ENTITY_4"]
        );
    }

    #[tokio::test]
    async fn test_expand_store_failure_is_fatal() {
        let mut extractor = MockExtractor::new();
        extractor
            .expect_extract()
            .returning(|_, _| Ok(Some(jake_graph())));

        let mut store = MockGraphStore::new();
        store.expect_lookup_nodes().returning(|_| Ok(vec![]));
        store
            .expect_add_nodes()
            .times(1)
            .returning(|_| Err(LoomError::graph_connection("store unavailable")));
        store.expect_add_edges().times(0);

        let expander = GraphExpander::new(Arc::new(extractor), Arc::new(store));
        let err = expander
            .expand(vec![chunk("first")], &ExtractionSchema::default())
            .await
            .unwrap_err();

        assert_eq!(err.code(), crate::error::ErrorCode::GrpConnectionFailed);
    }
}
