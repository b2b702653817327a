//! SQLite <-> petgraph synchronization.
//!
//! Provides functions to load graph data from SQLite into petgraph
//! and persist batches back to SQLite.

use rusqlite::{params, Connection};

use graphloom_core::error::LoomResult;
use graphloom_core::types::Attributes;

use super::petgraph_ops::GraphState;

/// Load the entire graph from SQLite, in insertion order.
///
/// This is called on startup to hydrate the in-memory graph.
pub fn load_graph(conn: &Connection) -> LoomResult<GraphState> {
    let mut state = GraphState::new();

    let mut stmt = conn.prepare("SELECT id, attributes FROM nodes ORDER BY rowid")?;
    let node_iter = stmt.query_map([], |row| {
        let id: String = row.get(0)?;
        let attributes: String = row.get(1)?;
        Ok((id, attributes))
    })?;

    for node in node_iter {
        let (id, attributes) = node?;
        state.upsert_node(&id, parse_attributes(&id, &attributes));
    }

    let mut stmt = conn.prepare(
        "SELECT source_id, target_id, relationship_name, attributes FROM edges ORDER BY id",
    )?;
    let edge_iter = stmt.query_map([], |row| {
        let source_id: String = row.get(0)?;
        let target_id: String = row.get(1)?;
        let relationship_name: String = row.get(2)?;
        let attributes: String = row.get(3)?;
        Ok((source_id, target_id, relationship_name, attributes))
    })?;

    for edge in edge_iter {
        let (source_id, target_id, relationship_name, attributes) = edge?;
        let attributes = parse_attributes(&relationship_name, &attributes);
        state.upsert_edge(&source_id, &target_id, &relationship_name, attributes);
    }

    Ok(state)
}

fn parse_attributes(owner: &str, raw: &str) -> Attributes {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable attributes of '{}': {}", owner, e);
        Attributes::new()
    })
}

/// Save a node, replacing the attributes of an existing row.
pub fn save_node(conn: &Connection, id: &str, attributes: &Attributes) -> LoomResult<()> {
    let attributes = serde_json::to_string(attributes)?;

    conn.execute(
        r#"
        INSERT INTO nodes (id, attributes, updated_at)
        VALUES (?1, ?2, datetime('now'))
        ON CONFLICT(id) DO UPDATE SET
            attributes = excluded.attributes,
            updated_at = datetime('now')
        "#,
        params![id, attributes],
    )?;

    Ok(())
}

/// Save an attribute-less node unless it already exists.
pub fn save_placeholder_node(conn: &Connection, id: &str) -> LoomResult<()> {
    conn.execute(
        "INSERT INTO nodes (id) VALUES (?1) ON CONFLICT(id) DO NOTHING",
        params![id],
    )?;
    Ok(())
}

/// Save an edge, replacing the attributes of an existing row.
pub fn save_edge(
    conn: &Connection,
    source_id: &str,
    target_id: &str,
    relationship_name: &str,
    attributes: &Attributes,
) -> LoomResult<()> {
    let attributes = serde_json::to_string(attributes)?;

    conn.execute(
        r#"
        INSERT INTO edges (source_id, target_id, relationship_name, attributes, updated_at)
        VALUES (?1, ?2, ?3, ?4, datetime('now'))
        ON CONFLICT(source_id, target_id, relationship_name) DO UPDATE SET
            attributes = excluded.attributes,
            updated_at = datetime('now')
        "#,
        params![source_id, target_id, relationship_name, attributes],
    )?;

    Ok(())
}
