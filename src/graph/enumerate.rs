//! Exhaustive downstream path enumeration.
//!
//! Explicit-stack depth-first search: every stack frame owns its partial
//! path, so a node may appear on many paths but never twice on the same one.
//! Every maximal simple path from the start is recorded, ending at a target
//! node, at a node with nothing left to follow, or at the depth cap.
//!
//! Worst-case output is exponential in branching factor; the path cap in
//! [`TraversalLimits`](super::filter::TraversalLimits) bounds it.

use crate::error::Result;
use crate::graph::endpoint::{classify_endpoint, EndpointKind, NeighborCounts};
use crate::graph::filter::{Budget, TraversalFilter};
use crate::graph::index::{Adjacent, GraphIndex};
use crate::observability::TraversalStats;
use crate::types::{NodeId, RawPath};

/// Paths found by one enumeration plus its counters.
#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    pub paths: Vec<RawPath>,
    pub stats: TraversalStats,
}

/// Enumerates every simple downstream path from a start node.
pub struct PathEnumerator<'g> {
    graph: &'g GraphIndex,
}

impl<'g> PathEnumerator<'g> {
    pub fn new(graph: &'g GraphIndex) -> Self {
        Self { graph }
    }

    /// All downstream paths from `start`. Order is unspecified.
    pub fn find_paths(&self, start: NodeId, filter: &TraversalFilter) -> Result<Vec<RawPath>> {
        Ok(self.enumerate(start, filter)?.paths)
    }

    /// Like [`find_paths`](Self::find_paths), also returning traversal counters.
    pub fn enumerate(&self, start: NodeId, filter: &TraversalFilter) -> Result<Enumeration> {
        filter.validate()?;
        self.graph.node(start)?;

        tracing::debug!(
            start,
            ignored = filter.ignore_node_ids.len(),
            targets = filter.target_data_codes.len(),
            "enumerating downstream paths"
        );

        let limits = &filter.limits;
        let mut budget = Budget::new(limits);
        let mut stats = TraversalStats::default();
        let mut paths: Vec<RawPath> = Vec::new();
        let mut stack: Vec<RawPath> = vec![RawPath::single(start)];

        while let Some(mut path) = stack.pop() {
            budget.tick()?;

            let Some(current) = path.terminal() else {
                continue;
            };
            let node = self.graph.node(current)?;
            let adjacency = self.graph.neighbors(current);

            let endpoint = if current != start && filter.is_target(node) {
                classify_endpoint(true, NeighborCounts::new(adjacency.len(), 0))
            } else {
                let open = self.open_neighbors(&path, adjacency, filter)?;
                match classify_endpoint(false, NeighborCounts::new(adjacency.len(), open.len())) {
                    Some(kind) => Some(kind),
                    None if limits.max_depth.is_some_and(|cap| path.len() >= cap) => {
                        Some(EndpointKind::DepthCap)
                    }
                    None => {
                        for adj in open {
                            stack.push(path.extended(adj.hop(), adj.neighbor, adj.cost));
                        }
                        None
                    }
                }
            };

            let Some(kind) = endpoint else {
                continue;
            };
            path.endpoint = Some(kind);
            stats.record(kind);
            paths.push(path);

            // Every pending frame yields at least one more path.
            if limits.max_paths.is_some_and(|cap| paths.len() >= cap) && !stack.is_empty() {
                stats.truncated = true;
                tracing::warn!(
                    start,
                    cap = paths.len(),
                    pending = stack.len(),
                    "path cap reached, enumeration truncated"
                );
                break;
            }
        }

        stats.steps = budget.steps();
        stats.elapsed_ms = budget.elapsed().as_millis() as u64;
        tracing::info!(
            start,
            paths = stats.paths,
            leaf = stats.leaf_paths,
            target = stats.target_paths,
            boundary = stats.boundary_paths,
            steps = stats.steps,
            "enumeration finished"
        );

        Ok(Enumeration { paths, stats })
    }

    /// Adjacency entries the path may still follow from its last node.
    fn open_neighbors<'a>(
        &self,
        path: &RawPath,
        adjacency: &'a [Adjacent],
        filter: &TraversalFilter,
    ) -> Result<Vec<&'a Adjacent>> {
        let mut open = Vec::with_capacity(adjacency.len());
        for adj in adjacency {
            if filter.is_ignored(adj.neighbor) {
                continue;
            }
            let neighbor = self.graph.neighbor_node(adj)?;
            if !filter.admits(neighbor) {
                continue;
            }
            if path.contains(adj.neighbor) {
                continue;
            }
            open.push(adj);
        }
        Ok(open)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
