//! Point-to-point routing between two known nodes.
//!
//! - [`RouteFinder::shortest_route`]: cheapest route, Dijkstra stopping when
//!   the destination settles.
//! - [`RouteFinder::any_route`]: fewest-hop route by breadth-first search.
//!   Not cost-optimal; useful as a quick connectivity check.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::Result;
use crate::graph::assemble::PathAssembler;
use crate::graph::dijkstra::Frontier;
use crate::graph::filter::{Budget, TraversalFilter};
use crate::graph::index::GraphIndex;
use crate::types::{Hop, NodeId, PathResult, RawPath};

enum Precheck {
    Unreachable,
    Trivial(RawPath),
    Search,
}

pub struct RouteFinder<'g> {
    graph: &'g GraphIndex,
}

impl<'g> RouteFinder<'g> {
    pub fn new(graph: &'g GraphIndex) -> Self {
        Self { graph }
    }

    /// Cheapest route from `from` to `to`, or `None` if unreachable.
    pub fn shortest_route(
        &self,
        from: NodeId,
        to: NodeId,
        filter: &TraversalFilter,
    ) -> Result<Option<PathResult>> {
        match self.precheck(from, to, filter)? {
            Precheck::Unreachable => return Ok(None),
            Precheck::Trivial(raw) => return self.finish(&raw).map(Some),
            Precheck::Search => {}
        }

        let mut frontier = Frontier::new(self.graph, filter, from)?;
        while let Some((current, dist)) = frontier.settle_next()? {
            if current == to {
                let raw = frontier.path_to(current, None);
                tracing::debug!(
                    from,
                    to,
                    hops = raw.len(),
                    cost = raw.total_cost,
                    steps = frontier.steps(),
                    "shortest route found"
                );
                return self.finish(&raw).map(Some);
            }
            let open = frontier.open_neighbors(current)?;
            frontier.relax(current, dist, &open);
        }

        tracing::debug!(from, to, steps = frontier.steps(), "no route");
        Ok(None)
    }

    /// Fewest-hop route from `from` to `to` within `max_depth` links.
    pub fn any_route(
        &self,
        from: NodeId,
        to: NodeId,
        filter: &TraversalFilter,
        max_depth: Option<usize>,
    ) -> Result<Option<PathResult>> {
        match self.precheck(from, to, filter)? {
            Precheck::Unreachable => return Ok(None),
            Precheck::Trivial(raw) => return self.finish(&raw).map(Some),
            Precheck::Search => {}
        }

        let mut budget = Budget::new(&filter.limits);
        let mut previous: HashMap<NodeId, (NodeId, Hop, f64)> = HashMap::new();
        let mut visited: HashSet<NodeId> = HashSet::from([from]);
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::from([(from, 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            budget.tick()?;
            if max_depth.is_some_and(|cap| depth >= cap) {
                continue;
            }

            for adj in self.graph.neighbors(current) {
                if filter.is_ignored(adj.neighbor) || visited.contains(&adj.neighbor) {
                    continue;
                }
                let neighbor = self.graph.neighbor_node(adj)?;
                if !filter.admits(neighbor) {
                    continue;
                }
                visited.insert(adj.neighbor);
                previous.insert(adj.neighbor, (current, adj.hop(), adj.cost));

                if adj.neighbor == to {
                    let raw = Self::unwind(from, to, &previous);
                    tracing::debug!(
                        from,
                        to,
                        hops = raw.len(),
                        steps = budget.steps(),
                        "route found"
                    );
                    return self.finish(&raw).map(Some);
                }
                queue.push_back((adj.neighbor, depth + 1));
            }
        }

        tracing::debug!(from, to, steps = budget.steps(), "no route");
        Ok(None)
    }

    fn precheck(&self, from: NodeId, to: NodeId, filter: &TraversalFilter) -> Result<Precheck> {
        filter.validate()?;
        self.graph.node(from)?;
        let target = self.graph.node(to)?;

        if from == to {
            return Ok(Precheck::Trivial(RawPath::single(from)));
        }
        if filter.is_ignored(to) || !filter.admits(target) {
            tracing::debug!(from, to, "destination excluded by filter");
            return Ok(Precheck::Unreachable);
        }
        Ok(Precheck::Search)
    }

    fn unwind(
        from: NodeId,
        to: NodeId,
        previous: &HashMap<NodeId, (NodeId, Hop, f64)>,
    ) -> RawPath {
        let mut node_seq = vec![to];
        let mut link_seq = Vec::new();
        let mut total_cost = 0.0;
        let mut current = to;
        while current != from {
            let Some(&(prev, hop, cost)) = previous.get(&current) else {
                break;
            };
            node_seq.push(prev);
            link_seq.push(hop);
            total_cost += cost;
            current = prev;
        }
        node_seq.reverse();
        link_seq.reverse();
        RawPath {
            node_seq,
            link_seq,
            total_cost,
            endpoint: None,
        }
    }

    fn finish(&self, raw: &RawPath) -> Result<PathResult> {
        PathAssembler::new(self.graph).to_path_result(1, raw)
    }
}
