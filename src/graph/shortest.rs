//! Closest-endpoint search.
//!
//! Dijkstra pops nodes in non-decreasing distance order, so the first
//! settled node that classifies as an endpoint is the closest one. The
//! single-result search stops right there; [`ShortestPathFinder::find_endpoint_paths`]
//! keeps going and reports every endpoint it settles.

use std::sync::Arc;

use crate::error::{Result, TraceError};
use crate::graph::assemble::PathAssembler;
use crate::graph::dijkstra::Frontier;
use crate::graph::endpoint::{classify_endpoint, NeighborCounts};
use crate::graph::filter::{parse_id_list, parse_target_codes, TraversalFilter};
use crate::graph::index::GraphIndex;
use crate::observability::TraversalStats;
use crate::types::{NodeId, PathResult};

/// Paths found by one Dijkstra run plus its counters.
#[derive(Debug, Clone, Default)]
pub struct Search {
    pub paths: Vec<PathResult>,
    pub stats: TraversalStats,
}

/// Dijkstra-based search for the endpoint(s) nearest to a start node.
///
/// Holds a shared handle to the graph; searching before [`load`](Self::load)
/// fails with [`TraceError::GraphNotLoaded`].
#[derive(Debug, Clone, Default)]
pub struct ShortestPathFinder {
    graph: Option<Arc<GraphIndex>>,
}

impl ShortestPathFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph(graph: Arc<GraphIndex>) -> Self {
        Self { graph: Some(graph) }
    }

    /// Install (or replace) the graph snapshot searched by this finder.
    pub fn load(&mut self, graph: Arc<GraphIndex>) {
        tracing::debug!(
            nodes = graph.node_count(),
            links = graph.link_count(),
            "shortest-path finder loaded graph"
        );
        self.graph = Some(graph);
    }

    pub fn is_loaded(&self) -> bool {
        self.graph.is_some()
    }

    fn graph(&self) -> Result<&GraphIndex> {
        self.graph.as_deref().ok_or(TraceError::GraphNotLoaded)
    }

    /// The path to the closest endpoint, or `None` when no endpoint is
    /// reachable under the filter.
    pub fn find_shortest_path(
        &self,
        start: NodeId,
        filter: &TraversalFilter,
    ) -> Result<Option<PathResult>> {
        Ok(self.search(start, filter)?.paths.into_iter().next())
    }

    /// [`find_shortest_path`](Self::find_shortest_path) taking the ignore
    /// list and target codes as comma-separated strings, parsed leniently.
    pub fn find_shortest_path_with(
        &self,
        start: NodeId,
        ignore_node_ids: &str,
        target_data_codes: &str,
    ) -> Result<Option<PathResult>> {
        let filter = TraversalFilter {
            ignore_node_ids: parse_id_list(ignore_node_ids),
            target_data_codes: parse_target_codes(target_data_codes),
            ..TraversalFilter::default()
        };
        self.find_shortest_path(start, &filter)
    }

    /// Like [`find_shortest_path`](Self::find_shortest_path), also returning
    /// traversal counters.
    pub fn search(&self, start: NodeId, filter: &TraversalFilter) -> Result<Search> {
        self.run(start, filter, true)
    }

    /// Shortest path to every endpoint reachable from `start`, ordinals in
    /// settle order (non-decreasing cost). Endpoints are not expanded through.
    pub fn find_endpoint_paths(
        &self,
        start: NodeId,
        filter: &TraversalFilter,
    ) -> Result<Vec<PathResult>> {
        Ok(self.search_endpoints(start, filter)?.paths)
    }

    pub fn search_endpoints(&self, start: NodeId, filter: &TraversalFilter) -> Result<Search> {
        self.run(start, filter, false)
    }

    fn run(&self, start: NodeId, filter: &TraversalFilter, first_only: bool) -> Result<Search> {
        let graph = self.graph()?;
        let mut frontier = Frontier::new(graph, filter, start)?;
        let assembler = PathAssembler::new(graph);

        tracing::debug!(
            start,
            first_only,
            ignored = filter.ignore_node_ids.len(),
            targets = filter.target_data_codes.len(),
            "dijkstra search started"
        );

        let mut stats = TraversalStats::default();
        let mut paths: Vec<PathResult> = Vec::new();

        while let Some((current, dist)) = frontier.settle_next()? {
            // Settled but neither an endpoint nor a way through.
            if filter.is_ignored(current) {
                continue;
            }

            let open = frontier.open_neighbors(current)?;

            if current != start {
                let node = graph.node(current)?;
                let counts = NeighborCounts::new(graph.neighbors(current).len(), open.len());
                if let Some(kind) = classify_endpoint(filter.is_target(node), counts) {
                    let raw = frontier.path_to(current, Some(kind));
                    let ordinal = paths.len() as u32 + 1;
                    paths.push(assembler.to_path_result(ordinal, &raw)?);
                    stats.record(kind);
                    if first_only {
                        break;
                    }
                    continue;
                }
            }

            frontier.relax(current, dist, &open);
        }

        stats.steps = frontier.steps();
        stats.elapsed_ms = frontier.elapsed().as_millis() as u64;

        match paths.first() {
            Some(first) => tracing::info!(
                start,
                paths = paths.len(),
                nearest = first.end_node_id,
                cost = first.total_cost,
                steps = stats.steps,
                "dijkstra search finished"
            ),
            None => tracing::info!(start, steps = stats.steps, "no endpoint reachable"),
        }

        Ok(Search { paths, stats })
    }
}
