//! Result cache keyed by a hash of the search parameters.
//!
//! The key covers the graph fingerprint, so results computed against an
//! older snapshot are never returned for a new one; they simply age out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::graph::filter::TraversalFilter;
use crate::graph::index::GraphIndex;
use crate::types::{NodeId, PathResult};

pub const DEFAULT_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Hex SHA-256 over everything that determines a search result.
pub fn parameter_hash(
    graph: &GraphIndex,
    algorithm: &str,
    start: NodeId,
    filter: &TraversalFilter,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(graph.fingerprint().as_bytes());
    hasher.update(b"|");
    hasher.update(algorithm.as_bytes());
    hasher.update(b"|");
    hasher.update(start.to_le_bytes());
    hasher.update(b"|");
    hasher.update(filter.canonical().as_bytes());
    hex::encode(hasher.finalize())
}

/// A stored search result and whether the path cap cut it short.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPaths {
    pub paths: Arc<Vec<PathResult>>,
    pub truncated: bool,
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedPaths,
    inserted: Instant,
}

/// Bounded TTL cache of search results.
///
/// When full, the oldest entry is evicted. A cache built with
/// [`PathCache::disabled`] stores nothing and always misses.
#[derive(Debug)]
pub struct PathCache {
    entries: HashMap<String, CacheEntry>,
    max_entries: usize,
    ttl: Duration,
    enabled: bool,
    hits: u64,
    misses: u64,
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL)
    }
}

impl PathCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
            ttl,
            enabled: max_entries > 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(0, Duration::ZERO)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cached result for `key`, dropping it if it has expired.
    pub fn get(&mut self, key: &str) -> Option<CachedPaths> {
        if !self.enabled {
            return None;
        }
        let expired = match self.entries.get(key) {
            Some(entry) if entry.inserted.elapsed() < self.ttl => {
                self.hits += 1;
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        self.misses += 1;
        None
    }

    /// Store `paths` under `key` and hand back the shared copy.
    pub fn insert(&mut self, key: String, paths: Vec<PathResult>, truncated: bool) -> CachedPaths {
        let value = CachedPaths {
            paths: Arc::new(paths),
            truncated,
        };
        if !self.enabled {
            return value;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.purge_expired();
            if self.entries.len() >= self.max_entries {
                self.evict_oldest();
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                inserted: Instant::now(),
            },
        );
        value
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.inserted.elapsed() < ttl);
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(removed, "purged expired cache entries");
        }
        removed
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
