//! Configuration data structures for nettrace.
//!
//! Defines the YAML config format: default algorithm, traversal limits,
//! result cache sizing and the logging filter.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceError};
use crate::graph::cache::{PathCache, DEFAULT_MAX_ENTRIES};
use crate::graph::filter::{TraversalLimits, DEFAULT_MAX_PATHS};
use crate::observability::DEFAULT_LOG_FILTER;

/// Config format major version understood by this build.
const SUPPORTED_MAJOR: &str = "1";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for a tracing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Config format version (currently "1.0").
    #[serde(default = "default_version")]
    pub version: String,

    /// Algorithm used when a request does not name one.
    #[serde(default)]
    pub algorithm: Algorithm,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            algorithm: Algorithm::default(),
            limits: LimitsConfig::default(),
            cache: CacheConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl TraceConfig {
    /// Reject configurations no traversal could honour.
    pub fn validate(&self) -> Result<()> {
        let major = self.version.split('.').next().unwrap_or_default().trim();
        if major != SUPPORTED_MAJOR {
            return Err(TraceError::Config(format!(
                "unsupported config version '{}' (expected {SUPPORTED_MAJOR}.x)",
                self.version
            )));
        }
        if self.limits.max_paths == 0 {
            return Err(TraceError::Config("limits.max_paths must be > 0".into()));
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(TraceError::Config(
                "cache.max_entries must be > 0 when the cache is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Traversal limits applied to every request.
    pub fn limits(&self) -> TraversalLimits {
        self.limits.to_traversal_limits()
    }
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Every maximal simple downstream path (depth-first enumeration).
    AllPaths,
    /// Path to the single closest endpoint.
    #[default]
    Shortest,
    /// Shortest path to every reachable endpoint.
    Endpoints,
}

impl Algorithm {
    /// Parse from a loose string (case-insensitive, `-`/`_` accepted).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "all_paths" | "allpaths" | "dfs" => Some(Self::AllPaths),
            "shortest" | "dijkstra" => Some(Self::Shortest),
            "endpoints" | "all_endpoints" | "downstream" => Some(Self::Endpoints),
            _ => None,
        }
    }

    /// Canonical string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllPaths => "all_paths",
            Self::Shortest => "shortest",
            Self::Endpoints => "endpoints",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LimitsConfig
// ---------------------------------------------------------------------------

/// Safety valves, in config-file units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,

    /// Wall-clock budget per traversal, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_paths: default_max_paths(),
            max_depth: None,
            max_steps: None,
            deadline_ms: None,
        }
    }
}

impl LimitsConfig {
    pub fn to_traversal_limits(&self) -> TraversalLimits {
        TraversalLimits {
            max_paths: Some(self.max_paths),
            max_depth: self.max_depth,
            max_steps: self.max_steps,
            deadline: self.deadline_ms.map(Duration::from_millis),
        }
    }
}

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// An empty cache sized by this config.
    pub fn build(&self) -> PathCache {
        if self.enabled {
            PathCache::new(self.max_entries, self.ttl())
        } else {
            PathCache::disabled()
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_version() -> String {
    "1.0".to_string()
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_max_paths() -> usize {
    DEFAULT_MAX_PATHS
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_ttl_secs() -> u64 {
    3600
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
