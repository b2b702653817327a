//! Integration tests for graph synthesis through the public API.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use graphloom_core::knowledge::{synthesize, TypeRegistry};
use graphloom_core::types::{CONTAINS, CONTAINS_ENTITY_TYPE, IS_ENTITY_TYPE};
use graphloom_core::{Chunk, ChunkGraph, GraphNode, RawEdge, RawNode};

fn jake_graph() -> ChunkGraph {
    ChunkGraph {
        nodes: vec![
            RawNode::new("Jake", "person", "An engineer"),
            RawNode::new("Acme Corp", "organization", "A company"),
        ],
        edges: vec![RawEdge::new("Jake", "Acme Corp", "works_at")],
    }
}

#[test]
fn test_synthesize_with_known_types() {
    let document_id = Uuid::new_v4();
    let chunks = vec![
        Chunk::new(document_id, "Jake works at Acme Corp."),
        Chunk::new(document_id, "unreadable"),
    ];
    let graphs = vec![Some(jake_graph()), None];
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

    // PERSON is already in the store
    let registry = TypeRegistry::from_nodes([GraphNode::new("PERSON", Default::default())]);

    let (batch, registry) = synthesize(&chunks, &graphs, registry, now);

    let node_ids: Vec<_> = batch.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(node_ids, vec!["JAKE", "ACME_CORP", "ORGANIZATION"]);
    assert_eq!(registry.len(), 2);
    assert!(registry.contains("ORGANIZATION"));

    let jake = &batch.nodes[0];
    assert_eq!(jake.attr_str("type"), Some("Person"));
    assert_eq!(jake.attr_str("created_at"), Some("2024-03-01 12:30:00"));
    assert_eq!(jake.attr_str("chunk_id"), Some(chunks[0].chunk_id.to_string().as_str()));

    let count = |rel: &str| batch.edges.iter().filter(|e| e.relationship_name == rel).count();
    assert_eq!(count(CONTAINS), 2);
    assert_eq!(count(CONTAINS_ENTITY_TYPE), 2);
    assert_eq!(count(IS_ENTITY_TYPE), 2);

    let works_at: Vec<_> = batch
        .edges
        .iter()
        .filter(|e| e.relationship_name == "works_at")
        .collect();
    assert_eq!(works_at.len(), 1);
    assert_eq!(works_at[0].source_id, "JAKE");
    assert_eq!(works_at[0].target_id, "ACME_CORP");

    // Nothing refers to the unextracted chunk
    let skipped = chunks[1].chunk_id.to_string();
    assert!(batch.edges.iter().all(|e| e.source_id != skipped));
}

#[test]
fn test_synthesize_all_chunks_empty() {
    let chunks = vec![Chunk::new(Uuid::new_v4(), "nothing")];
    let (batch, registry) = synthesize(&chunks, &[None], TypeRegistry::new(), Utc::now());

    assert!(batch.is_empty());
    assert!(registry.is_empty());
}
