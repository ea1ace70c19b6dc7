//! Resolution memo.
//!
//! # Responsibilities
//! - Remember the outcome of a `(host, method, path)` resolution
//! - Drop everything when the route table changes
//! - Refuse entries that disagree with the current table
//!
//! # Design Decisions
//! - Entries are tagged with the table generation they were computed against
//! - Bounded: once full, new outcomes are simply not remembered
//! - A stale or out-of-range entry is an invariant violation: logged at error
//!   level, evicted, and the caller falls back to a scan

use axum::http::Method;
use dashmap::DashMap;

/// Cache key. Host and path are normalized by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub host: String,
    pub method: Method,
    pub path: String,
}

/// A remembered resolution, referring to a route by table index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedOutcome {
    Matched {
        index: usize,
        path: String,
        params: Vec<String>,
    },
    NotFound,
    MethodNotAllowed {
        allowed: Vec<Method>,
    },
}

#[derive(Debug)]
struct Entry {
    generation: u64,
    outcome: CachedOutcome,
}

/// Concurrent resolution cache.
#[derive(Debug)]
pub struct RouteCache {
    entries: DashMap<CacheKey, Entry>,
    capacity: usize,
}

impl RouteCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
        }
    }

    /// Look up an outcome computed against `generation` of a table with `table_len` routes.
    pub fn get(&self, key: &CacheKey, generation: u64, table_len: usize) -> Option<CachedOutcome> {
        let stale = match self.entries.get(key) {
            None => return None,
            Some(entry) => {
                let in_range = match &entry.outcome {
                    CachedOutcome::Matched { index, .. } => *index < table_len,
                    _ => true,
                };
                if entry.generation == generation && in_range {
                    return Some(entry.outcome.clone());
                }
                tracing::error!(
                    host = %key.host,
                    method = %key.method,
                    path = %key.path,
                    entry_generation = entry.generation,
                    table_generation = generation,
                    table_len,
                    outcome = ?entry.outcome,
                    "Route cache entry inconsistent with route table, evicting"
                );
                true
            }
        };
        if stale {
            self.entries.remove(key);
        }
        None
    }

    /// Remember an outcome unless the cache is full.
    pub fn insert(&self, key: CacheKey, generation: u64, outcome: CachedOutcome) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            return;
        }
        self.entries.insert(key, Entry { generation, outcome });
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
