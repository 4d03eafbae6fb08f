//! Entry Index
//!
//! In-memory index of cached entry metadata using Moka. Avoids re-reading
//! metadata sidecars on repeated lookups and tracks hit/miss counters for
//! the store.

use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use tracing::trace;

use super::store::EntryMeta;

/// In-memory index of entry metadata with lookup counters
pub struct EntryIndex {
    /// Memoized sidecar metadata by resource path
    entries: Cache<String, EntryMeta>,
    /// Store lookup hit counter
    hits: AtomicU64,
    /// Store lookup miss counter
    misses: AtomicU64,
}

impl EntryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        let entries = Cache::builder().name("asset_entry_index").build();
        Self {
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get memoized metadata for a resource path
    pub fn get(&self, path: &str) -> Option<EntryMeta> {
        let meta = self.entries.get(path);
        trace!(
            path = path,
            indexed = meta.is_some(),
            "Entry index lookup"
        );
        meta
    }

    /// Insert (or replace) metadata for a resource path
    pub fn insert(&self, path: &str, meta: EntryMeta) {
        self.entries.insert(path.to_string(), meta);
    }

    /// Drop a resource path from the index
    pub fn invalidate(&self, path: &str) {
        self.entries.invalidate(path);
    }

    /// Record a store lookup hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a store lookup miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get lookup counters
    ///
    /// Returns (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl Default for EntryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_meta(path: &str) -> EntryMeta {
        EntryMeta {
            path: path.to_string(),
            version: "1".to_string(),
            status: 200,
            content_type: Some("text/html".to_string()),
            size: 5,
            sha1: "da39a3ee5e6b4b0d3255bfef95601890afd80709".to_string(),
            stored_at: 0,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let index = EntryIndex::new();
        assert!(index.get("index.html").is_none());

        index.insert("index.html", test_meta("index.html"));
        let meta = index.get("index.html").unwrap();
        assert_eq!(meta.path, "index.html");
        assert_eq!(meta.status, 200);
    }

    #[test]
    fn test_invalidate() {
        let index = EntryIndex::new();
        index.insert("main.js", test_meta("main.js"));
        assert!(index.get("main.js").is_some());

        index.invalidate("main.js");
        assert!(index.get("main.js").is_none());
    }

    #[test]
    fn test_counters() {
        let index = EntryIndex::new();
        assert_eq!(index.stats(), (0, 0));

        index.record_hit();
        index.record_hit();
        index.record_miss();
        assert_eq!(index.stats(), (2, 1));
    }
}
