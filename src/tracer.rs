//! Request-level facade over the traversal engines.
//!
//! A [`Tracer`] owns one graph snapshot and one [`TraceConfig`]. Every
//! request runs under the config's limits, goes through the result cache,
//! and comes back as assembled [`PathResult`]s numbered from 1.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::{Algorithm, TraceConfig};
use crate::error::Result;
use crate::graph::assemble::PathAssembler;
use crate::graph::cache::{parameter_hash, CachedPaths, PathCache};
use crate::graph::enumerate::PathEnumerator;
use crate::graph::filter::TraversalFilter;
use crate::graph::index::GraphIndex;
use crate::graph::shortest::ShortestPathFinder;
use crate::types::{NodeId, PathResult, RawPath};

/// One start node plus everything that shapes its search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRequest {
    pub start: NodeId,
    /// `None` uses the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    /// Limits on this filter are replaced by the configured ones.
    #[serde(default)]
    pub filter: TraversalFilter,
}

impl TraceRequest {
    pub fn new(start: NodeId) -> Self {
        Self {
            start,
            algorithm: None,
            filter: TraversalFilter::default(),
        }
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn filter(mut self, filter: TraversalFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Result of one request, with how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceOutcome {
    pub paths: Arc<Vec<PathResult>>,
    /// The configured `max_paths` stopped enumeration early.
    pub truncated: bool,
    /// Served from the cache rather than recomputed.
    pub cached: bool,
}

impl TraceOutcome {
    fn new(stored: CachedPaths, cached: bool) -> Self {
        Self {
            paths: stored.paths,
            truncated: stored.truncated,
            cached,
        }
    }
}

pub struct Tracer {
    graph: Arc<GraphIndex>,
    config: TraceConfig,
    finder: ShortestPathFinder,
    cache: Mutex<PathCache>,
}

impl Tracer {
    pub fn new(graph: Arc<GraphIndex>, config: TraceConfig) -> Result<Self> {
        config.validate()?;
        let cache = Mutex::new(config.cache.build());
        Ok(Self {
            finder: ShortestPathFinder::with_graph(Arc::clone(&graph)),
            graph,
            config,
            cache,
        })
    }

    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Run one request, answering from the cache when possible.
    pub fn trace(&self, request: &TraceRequest) -> Result<Arc<Vec<PathResult>>> {
        Ok(self.trace_outcome(request)?.paths)
    }

    /// Like [`trace`](Self::trace), also reporting truncation and cache use.
    pub fn trace_outcome(&self, request: &TraceRequest) -> Result<TraceOutcome> {
        let algorithm = request.algorithm.unwrap_or(self.config.algorithm);
        let filter = TraversalFilter {
            limits: self.config.limits(),
            ..request.filter.clone()
        };
        let key = parameter_hash(&self.graph, algorithm.as_str(), request.start, &filter);

        if let Some(hit) = self.cache().get(&key) {
            tracing::debug!(start = request.start, %algorithm, key = &key[..8], "cache hit");
            return Ok(TraceOutcome::new(hit, true));
        }

        let (paths, truncated) = self.run(algorithm, request.start, &filter)?;
        tracing::info!(
            start = request.start,
            %algorithm,
            paths = paths.len(),
            truncated,
            "trace finished"
        );
        let stored = self.cache().insert(key, paths, truncated);
        Ok(TraceOutcome::new(stored, false))
    }

    /// Run independent requests, in parallel when the `parallel` feature is
    /// on. Results keep the order of `requests`.
    pub fn trace_many(&self, requests: &[TraceRequest]) -> Vec<Result<Arc<Vec<PathResult>>>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            requests.par_iter().map(|r| self.trace(r)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            requests.iter().map(|r| self.trace(r)).collect()
        }
    }

    /// `(hits, misses)` since construction.
    pub fn cache_stats(&self) -> (u64, u64) {
        let cache = self.cache();
        (cache.hits(), cache.misses())
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    fn run(
        &self,
        algorithm: Algorithm,
        start: NodeId,
        filter: &TraversalFilter,
    ) -> Result<(Vec<PathResult>, bool)> {
        let search = match algorithm {
            Algorithm::Shortest => self.finder.search(start, filter)?,
            Algorithm::Endpoints => self.finder.search_endpoints(start, filter)?,
            Algorithm::AllPaths => {
                let mut enumeration = PathEnumerator::new(&self.graph).enumerate(start, filter)?;
                // Stack order is arbitrary; number cheapest first.
                enumeration.paths.sort_by(|a, b| {
                    a.total_cost
                        .total_cmp(&b.total_cost)
                        .then_with(|| a.node_seq.cmp(&b.node_seq))
                });
                let paths = self.assemble(&enumeration.paths)?;
                return Ok((paths, enumeration.stats.truncated));
            }
        };
        Ok((search.paths, search.stats.truncated))
    }

    fn assemble(&self, raw: &[RawPath]) -> Result<Vec<PathResult>> {
        let assembler = PathAssembler::new(&self.graph);
        raw.iter()
            .zip(1u32..)
            .map(|(path, ordinal)| assembler.to_path_result(ordinal, path))
            .collect()
    }

    fn cache(&self) -> MutexGuard<'_, PathCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::error::TraceError;
    use crate::types::{Link, Node};
    use pretty_assertions::assert_eq as pa_eq;

    /// 1 -> 2 -> 4, 1 -> 3 -> 4, 4 -> 5 (5 is equipment 15000)
    fn graph() -> Arc<GraphIndex> {
        Arc::new(
            GraphIndex::build(
                vec![
                    Node::new(1),
                    Node::new(2),
                    Node::new(3),
                    Node::new(4),
                    Node::new(5).with_data_code(15000),
                ],
                vec![
                    Link::directed(12, 1, 2, 1.0),
                    Link::directed(13, 1, 3, 5.0),
                    Link::directed(24, 2, 4, 1.0),
                    Link::directed(34, 3, 4, 1.0),
                    Link::directed(45, 4, 5, 2.0),
                ],
            )
            .unwrap(),
        )
    }

    fn tracer() -> Tracer {
        Tracer::new(graph(), TraceConfig::default()).unwrap()
    }

    #[test]
    fn default_algorithm_is_shortest() {
        let paths = tracer().trace(&TraceRequest::new(1)).unwrap();
        assert_eq!(paths.len(), 1);
        pa_eq!(paths[0].node_ids(), vec![1, 2, 4, 5]);
    }

    #[test]
    fn all_paths_are_numbered_cheapest_first() {
        let paths = tracer()
            .trace(&TraceRequest::new(1).algorithm(Algorithm::AllPaths))
            .unwrap();
        let summary: Vec<(u32, Vec<NodeId>)> =
            paths.iter().map(|p| (p.ordinal, p.node_ids())).collect();
        pa_eq!(summary, vec![(1, vec![1, 2, 4, 5]), (2, vec![1, 3, 4, 5])]);
    }

    #[test]
    fn endpoints_algorithm_dispatches() {
        let paths = tracer()
            .trace(&TraceRequest::new(1).algorithm(Algorithm::Endpoints))
            .unwrap();
        // 3 settles after 4, leaving it nowhere to go
        let ends: Vec<NodeId> = paths.iter().map(|p| p.end_node_id).collect();
        pa_eq!(ends, vec![5, 3]);
    }

    #[test]
    fn repeated_request_hits_cache() {
        let tracer = tracer();
        let request = TraceRequest::new(1).algorithm(Algorithm::AllPaths);
        let first = tracer.trace(&request).unwrap();
        let second = tracer.trace(&request).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(tracer.cache_stats(), (1, 1));

        tracer.clear_cache();
        let third = tracer.trace(&request).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn disabled_cache_always_recomputes() {
        let config = TraceConfig {
            cache: CacheConfig {
                enabled: false,
                ..CacheConfig::default()
            },
            ..TraceConfig::default()
        };
        let tracer = Tracer::new(graph(), config).unwrap();
        let request = TraceRequest::new(1);
        let first = tracer.trace(&request).unwrap();
        let second = tracer.trace(&request).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }

    #[test]
    fn config_limits_override_request_limits() {
        let mut config = TraceConfig::default();
        config.limits.max_paths = 1;
        let tracer = Tracer::new(graph(), config).unwrap();

        let request = TraceRequest::new(1)
            .algorithm(Algorithm::AllPaths)
            .filter(TraversalFilter::new().max_paths(50));
        assert_eq!(tracer.trace(&request).unwrap().len(), 1);
    }

    #[test]
    fn truncation_is_reported_and_survives_the_cache() {
        let mut config = TraceConfig::default();
        config.limits.max_paths = 1;
        let tracer = Tracer::new(graph(), config).unwrap();
        let request = TraceRequest::new(1).algorithm(Algorithm::AllPaths);

        let fresh = tracer.trace_outcome(&request).unwrap();
        assert_eq!(fresh.paths.len(), 1);
        assert!(fresh.truncated);
        assert!(!fresh.cached);

        let again = tracer.trace_outcome(&request).unwrap();
        assert!(again.truncated);
        assert!(again.cached);
    }

    #[test]
    fn complete_results_are_not_truncated() {
        let tracer = tracer();
        for algorithm in [Algorithm::AllPaths, Algorithm::Shortest, Algorithm::Endpoints] {
            let outcome = tracer
                .trace_outcome(&TraceRequest::new(1).algorithm(algorithm))
                .unwrap();
            assert!(!outcome.truncated, "{algorithm}");
        }
    }

    #[test]
    fn trace_many_preserves_order() {
        let tracer = tracer();
        let requests: Vec<TraceRequest> =
            [3, 1, 99, 4].into_iter().map(TraceRequest::new).collect();
        let results = tracer.trace_many(&requests);

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap()[0].start_node_id, 3);
        assert_eq!(results[1].as_ref().unwrap()[0].start_node_id, 1);
        assert!(matches!(results[2], Err(TraceError::NodeNotFound(99))));
        assert_eq!(results[3].as_ref().unwrap()[0].end_node_id, 5);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = TraceConfig::default();
        config.limits.max_paths = 0;
        assert!(Tracer::new(graph(), config).is_err());
    }

    #[test]
    fn request_deserializes_from_json() {
        let request: TraceRequest = serde_json::from_str(
            r#"{"start": 7, "algorithm": "endpoints", "filter": {"utility_no": 13}}"#,
        )
        .unwrap();
        assert_eq!(request.start, 7);
        assert_eq!(request.algorithm, Some(Algorithm::Endpoints));
        assert_eq!(request.filter.utility_no, 13);
    }
}
