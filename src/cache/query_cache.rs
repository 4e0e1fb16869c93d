use std::collections::HashMap;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Identity of one cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Videos,
    Leaderboard,
    ProfileStats(String),
    Session,
}

/// Last known result of a query, plus its in-flight and error state.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    pub data: Option<Value>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_fetched_at: Option<Instant>,
}

/// Keyed request/response cache.
///
/// Entries are created on first request for a key, written only by fetch
/// completions and mutation handlers, and invalidated explicitly. When
/// the entry count exceeds the cap the least recently touched entry is
/// evicted.
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    /// Recency sequence per key; higher means touched later
    touched: HashMap<QueryKey, u64>,
    tick: u64,
    max_entries: usize,
}

pub const DEFAULT_MAX_ENTRIES: usize = 64;

impl QueryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            touched: HashMap::new(),
            tick: 0,
            max_entries: max_entries.max(1),
        }
    }

    pub fn entry(&mut self, key: &QueryKey) -> Option<CacheEntry> {
        let entry = self.entries.get(key).cloned();
        if entry.is_some() {
            self.tick += 1;
            self.touched.insert(key.clone(), self.tick);
        }
        entry
    }

    /// Typed view of an entry's data.
    pub fn data<T: DeserializeOwned>(&mut self, key: &QueryKey) -> Option<T> {
        self.entry(key)
            .and_then(|e| e.data)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Mark a fetch for `key` as in flight. Returns false when one is
    /// already running, so concurrent requests for the same key collapse
    /// into a single remote call.
    pub fn begin_fetch(&mut self, key: &QueryKey) -> bool {
        let entry = self.entries.entry(key.clone()).or_default();
        if entry.loading {
            return false;
        }
        entry.loading = true;
        self.touch(key);
        true
    }

    /// Record the outcome of an in-flight fetch. A failure keeps the last
    /// good data so the caller can keep showing it alongside the error.
    pub fn complete(&mut self, key: &QueryKey, result: Result<Value, String>) {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.loading = false;
        match result {
            Ok(value) => {
                entry.data = Some(value);
                entry.error = None;
                entry.last_fetched_at = Some(Instant::now());
            }
            Err(message) => {
                debug!("Query {key:?} failed: {message}");
                entry.error = Some(message);
            }
        }
        self.touch(key);
    }

    /// Patch an entry in place, as mutation handlers do after a remote
    /// write acknowledges.
    pub fn set_data<T: Serialize>(&mut self, key: &QueryKey, data: &T) {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.data = serde_json::to_value(data).ok();
        entry.error = None;
        entry.last_fetched_at = Some(Instant::now());
        self.touch(key);
    }

    /// Drop the entry so the next read refetches.
    pub fn invalidate(&mut self, key: &QueryKey) {
        self.entries.remove(key);
        self.touched.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &QueryKey) {
        self.tick += 1;
        self.touched.insert(key.clone(), self.tick);
        if self.entries.len() <= self.max_entries {
            return;
        }
        // Over cap: evict the least recently touched key, never the one
        // being written.
        let oldest = self
            .touched
            .iter()
            .filter(|(k, _)| *k != key)
            .min_by_key(|(_, at)| **at)
            .map(|(k, _)| k.clone());
        if let Some(victim) = oldest {
            debug!("Evicting cached query {victim:?}");
            self.entries.remove(&victim);
            self.touched.remove(&victim);
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
