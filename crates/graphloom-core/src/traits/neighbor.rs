//! Neighbor query trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LoomResult;

/// Node attribute shared by nodes that belong together.
pub const GROUPING_ATTRIBUTE: &str = "layer_uuid";

/// Node attribute returned by neighbor queries.
pub const DESCRIPTION_ATTRIBUTE: &str = "description";

/// Extra parameters for a neighbor query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborParams {
    /// Explicit target node id. Takes precedence over the query text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl NeighborParams {
    /// Parameters targeting `node_id`.
    pub fn node(node_id: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
        }
    }
}

/// Resolve the node a neighbor query targets.
///
/// An explicit `node_id` in params wins; otherwise the query text itself is
/// the node id.
pub fn resolve_target<'a>(query: &'a str, params: Option<&'a NeighborParams>) -> Option<&'a str> {
    Some(
        params
            .and_then(|params| params.node_id.as_deref())
            .unwrap_or(query),
    )
    .filter(|id| !id.trim().is_empty())
}

/// Finds the descriptions of all nodes sharing the target's grouping attribute.
#[async_trait]
pub trait NeighborQuery: Send + Sync {
    /// Descriptions of nodes in the same group as the target node.
    ///
    /// Returns an empty list when the target cannot be resolved, does not
    /// exist, or has no grouping attribute.
    async fn find_neighbors(
        &self,
        query: &str,
        params: Option<&NeighborParams>,
    ) -> LoomResult<Vec<String>>;
}
