//! Endpoint classification shared by every traversal.
//!
//! The predicate is pure: callers count a node's adjacency and how much of it
//! survives filtering, and [`classify_endpoint`] decides whether the node
//! ends a path. Precedence is Leaf, then Target, then Boundary.

pub use crate::types::EndpointKind;

/// Adjacency of one node as seen by a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeighborCounts {
    /// Every adjacency entry, filtered or not.
    pub total: usize,
    /// Entries the traversal could still follow from here.
    pub traversable: usize,
}

impl NeighborCounts {
    pub fn new(total: usize, traversable: usize) -> Self {
        Self { total, traversable }
    }
}

/// Decide whether a node terminates a path.
///
/// `is_target` must already be false for the start node; a start node never
/// ends its own path by target code.
pub fn classify_endpoint(is_target: bool, counts: NeighborCounts) -> Option<EndpointKind> {
    if counts.total == 0 {
        Some(EndpointKind::Leaf)
    } else if is_target {
        Some(EndpointKind::Target)
    } else if counts.traversable == 0 {
        Some(EndpointKind::Boundary)
    } else {
        None
    }
}
