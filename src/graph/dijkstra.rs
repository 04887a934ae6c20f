//! Dijkstra frontier shared by the shortest-path finder and the router.
//!
//! The frontier owns the heap, the tentative distances, the predecessor map
//! and the visited set. Callers drive the loop: settle the next node, decide
//! whether it ends the search, otherwise relax its open neighbors.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Duration;

use crate::error::Result;
use crate::graph::filter::{Budget, TraversalFilter};
use crate::graph::index::{Adjacent, GraphIndex};
use crate::types::{EndpointKind, Hop, NodeId, RawPath};

/// How a node was first reached on its current best path.
#[derive(Debug, Clone, Copy)]
struct Step {
    from: NodeId,
    hop: Hop,
}

pub(crate) struct Frontier<'a> {
    graph: &'a GraphIndex,
    filter: &'a TraversalFilter,
    heap: BinaryHeap<State>,
    distances: HashMap<NodeId, f64>,
    previous: HashMap<NodeId, Step>,
    visited: HashSet<NodeId>,
    budget: Budget,
}

impl<'a> Frontier<'a> {
    /// Seed the frontier with `start` at distance 0.
    pub(crate) fn new(
        graph: &'a GraphIndex,
        filter: &'a TraversalFilter,
        start: NodeId,
    ) -> Result<Self> {
        filter.validate()?;
        graph.node(start)?;

        let mut heap = BinaryHeap::new();
        heap.push(State {
            cost: 0.0,
            node: start,
        });
        let mut distances = HashMap::new();
        distances.insert(start, 0.0);

        Ok(Self {
            graph,
            filter,
            heap,
            distances,
            previous: HashMap::new(),
            visited: HashSet::new(),
            budget: Budget::new(&filter.limits),
        })
    }

    /// Pop the closest unsettled node and mark it visited.
    ///
    /// Stale heap entries for already-settled nodes are discarded.
    pub(crate) fn settle_next(&mut self) -> Result<Option<(NodeId, f64)>> {
        while let Some(State { cost, node }) = self.heap.pop() {
            self.budget.tick()?;
            if !self.visited.insert(node) {
                continue;
            }
            return Ok(Some((node, cost)));
        }
        Ok(None)
    }

    /// Adjacency of `node` still worth following: not ignored, not settled,
    /// and admitted by the attribute filters.
    pub(crate) fn open_neighbors(&self, node: NodeId) -> Result<Vec<Adjacent>> {
        let adjacency = self.graph.neighbors(node);
        let mut open = Vec::with_capacity(adjacency.len());
        for adj in adjacency {
            if self.filter.is_ignored(adj.neighbor) || self.visited.contains(&adj.neighbor) {
                continue;
            }
            let neighbor = self.graph.neighbor_node(adj)?;
            if self.filter.admits(neighbor) {
                open.push(*adj);
            }
        }
        Ok(open)
    }

    /// Relax every entry in `open` from `node`, settled at `dist`.
    pub(crate) fn relax(&mut self, node: NodeId, dist: f64, open: &[Adjacent]) {
        for adj in open {
            let candidate = dist + adj.cost;
            let improved = self
                .distances
                .get(&adj.neighbor)
                .map_or(true, |&best| candidate < best);
            if improved {
                self.distances.insert(adj.neighbor, candidate);
                self.previous.insert(
                    adj.neighbor,
                    Step {
                        from: node,
                        hop: adj.hop(),
                    },
                );
                self.heap.push(State {
                    cost: candidate,
                    node: adj.neighbor,
                });
            }
        }
    }

    /// Walk the predecessor chain back from `node` and return it start-first.
    pub(crate) fn path_to(&self, node: NodeId, endpoint: Option<EndpointKind>) -> RawPath {
        let mut node_seq = vec![node];
        let mut link_seq = Vec::new();
        let mut current = node;
        while let Some(step) = self.previous.get(&current) {
            link_seq.push(step.hop);
            node_seq.push(step.from);
            current = step.from;
        }
        node_seq.reverse();
        link_seq.reverse();

        RawPath {
            node_seq,
            link_seq,
            total_cost: self.distances.get(&node).copied().unwrap_or(0.0),
            endpoint,
        }
    }

    pub(crate) fn steps(&self) -> u64 {
        self.budget.steps()
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.budget.elapsed()
    }
}

/// Heap entry ordered so that `BinaryHeap` pops the lowest cost first.
/// Ties pop the lower node id first.
#[derive(Debug, Clone, Copy)]
struct State {
    cost: f64,
    node: NodeId,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}
