//! Structured logging and traversal metrics.
//!
//! This module provides:
//! - [`init_logging`]: One-time structured logging setup with `RUST_LOG` support
//! - [`TraversalStats`]: Per-call counters reported by every traversal

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::types::EndpointKind;

/// Default filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "nettrace=info";

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Defaults to `nettrace=info` when `RUST_LOG` is not set. Subsequent calls
/// are silently ignored.
pub fn init_logging() {
    init_logging_with(DEFAULT_LOG_FILTER);
}

/// Same as [`init_logging`], with an explicit fallback filter.
pub fn init_logging_with(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Counters collected during one traversal call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraversalStats {
    /// Loop iterations (stack pops or heap pops).
    pub steps: u64,
    pub paths: usize,
    pub leaf_paths: usize,
    pub target_paths: usize,
    pub boundary_paths: usize,
    pub depth_capped_paths: usize,
    /// The path cap stopped the search early.
    pub truncated: bool,
    pub elapsed_ms: u64,
}

impl TraversalStats {
    /// Count one recorded path.
    pub fn record(&mut self, kind: EndpointKind) {
        self.paths += 1;
        match kind {
            EndpointKind::Leaf => self.leaf_paths += 1,
            EndpointKind::Target => self.target_paths += 1,
            EndpointKind::Boundary => self.boundary_paths += 1,
            EndpointKind::DepthCap => self.depth_capped_paths += 1,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "steps": self.steps,
            "paths": self.paths,
            "leaf_paths": self.leaf_paths,
            "target_paths": self.target_paths,
            "boundary_paths": self.boundary_paths,
            "depth_capped_paths": self.depth_capped_paths,
            "truncated": self.truncated,
            "elapsed_ms": self.elapsed_ms,
        })
    }
}
