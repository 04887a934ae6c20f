//! Per-path node roles across a result set.
//!
//! A node's role depends on its position in the path and on how many paths
//! of the same result set pass through it: an intermediate node shared by
//! several paths is a convergence point.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{EndpointKind, NodeId, PathResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeRole {
    #[serde(rename = "S")]
    Start,
    /// Target or otherwise generic end.
    #[serde(rename = "E")]
    End,
    /// End node with no adjacency at all.
    #[serde(rename = "L")]
    Leaf,
    /// End node stopped by filters, ignores or visited neighbors.
    #[serde(rename = "F")]
    FilterBoundary,
    /// Intermediate node shared with another path.
    #[serde(rename = "C")]
    Convergence,
    #[serde(rename = "I")]
    Intermediate,
}

impl NodeRole {
    pub fn as_char(&self) -> char {
        match self {
            Self::Start => 'S',
            Self::End => 'E',
            Self::Leaf => 'L',
            Self::FilterBoundary => 'F',
            Self::Convergence => 'C',
            Self::Intermediate => 'I',
        }
    }

    fn for_end(endpoint: Option<EndpointKind>) -> Self {
        match endpoint {
            Some(EndpointKind::Leaf) => Self::Leaf,
            Some(EndpointKind::Boundary) => Self::FilterBoundary,
            Some(EndpointKind::Target) | Some(EndpointKind::DepthCap) | None => Self::End,
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Roles keyed by `(ordinal, node_id)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAnalysis {
    pub roles: BTreeMap<(u32, NodeId), NodeRole>,
}

impl RoleAnalysis {
    pub fn role(&self, ordinal: u32, node_id: NodeId) -> Option<NodeRole> {
        self.roles.get(&(ordinal, node_id)).copied()
    }

    pub fn counts(&self) -> BTreeMap<NodeRole, usize> {
        let mut counts = BTreeMap::new();
        for role in self.roles.values() {
            *counts.entry(*role).or_insert(0) += 1;
        }
        counts
    }
}

/// Assign a role to every node of every non-empty path.
pub fn analyze_node_roles(paths: &[PathResult]) -> RoleAnalysis {
    let mut path_counts: HashMap<NodeId, usize> = HashMap::new();
    for path in paths {
        let distinct: HashSet<NodeId> = path.node_ids().into_iter().collect();
        for node in distinct {
            *path_counts.entry(node).or_insert(0) += 1;
        }
    }

    let mut roles = BTreeMap::new();
    for path in paths.iter().filter(|p| !p.links.is_empty()) {
        let nodes = path.node_ids();
        let last = nodes.len() - 1;
        for (i, node) in nodes.into_iter().enumerate() {
            let role = if i == 0 {
                NodeRole::Start
            } else if i == last {
                NodeRole::for_end(path.endpoint)
            } else if path_counts.get(&node).copied().unwrap_or(0) > 1 {
                NodeRole::Convergence
            } else {
                NodeRole::Intermediate
            };
            roles.insert((path.ordinal, node), role);
        }
    }

    RoleAnalysis { roles }
}
