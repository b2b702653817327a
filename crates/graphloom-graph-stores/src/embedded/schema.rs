//! SQLite schema for embedded graph store.
//!
//! Two tables:
//! - `nodes`: canonical node id and JSON attributes
//! - `edges`: (source, target, relationship name) triples with JSON attributes
//!
//! Row order (`rowid`) is the graph's iteration order.

use rusqlite::Connection;

use graphloom_core::error::LoomResult;

/// SQL for the nodes table.
pub const CREATE_NODES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    id TEXT PRIMARY KEY NOT NULL,
    attributes TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

/// SQL for the edges table.
pub const CREATE_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    target_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    relationship_name TEXT NOT NULL,
    attributes TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(source_id, target_id, relationship_name)
)
"#;

/// Index for efficient traversal from source.
pub const CREATE_EDGES_SOURCE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id)
"#;

/// Index for efficient traversal to target.
pub const CREATE_EDGES_TARGET_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id)
"#;

/// Initialize the graph schema in the given database connection.
///
/// Safe to call multiple times.
pub fn init_schema(conn: &Connection) -> LoomResult<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(CREATE_NODES_TABLE, [])?;
    conn.execute(CREATE_EDGES_TABLE, [])?;

    conn.execute(CREATE_EDGES_SOURCE_INDEX, [])?;
    conn.execute(CREATE_EDGES_TARGET_INDEX, [])?;

    Ok(())
}
