//! Error types for nettrace.

use std::time::Duration;

use crate::types::{LinkId, NodeId};

/// Every fallible operation in the crate returns this error.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("graph not loaded: call load() before searching")]
    GraphNotLoaded,

    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),

    #[error("link {link_id} references missing node {node_id}")]
    DanglingLink { link_id: LinkId, node_id: NodeId },

    #[error("link {0} not found in graph")]
    LinkNotFound(LinkId),

    #[error("link {link_id} has invalid cost {cost}: costs must be finite and non-negative")]
    InvalidCost { link_id: LinkId, cost: f64 },

    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    #[error("duplicate link id {0}")]
    DuplicateLink(LinkId),

    #[error("traversal step budget of {budget} exhausted")]
    StepBudgetExhausted { budget: u64 },

    #[error("traversal deadline of {deadline:?} exceeded")]
    DeadlineExceeded { deadline: Duration },

    #[error("malformed path: {0}")]
    MalformedPath(String),

    #[error("invalid traversal filter: {0}")]
    InvalidFilter(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TraceError>;
