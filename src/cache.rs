//! Result cache shared by every resolution.
//!
//! Three tables, all insert-or-overwrite with no eviction:
//!
//! - resolved member/class sets by [`Fingerprint`],
//! - loaded classes by (host, name),
//! - the full class-name list per host.
//!
//! Concurrent misses on the same key are not coordinated: both resolutions
//! scan and both store. Values for one key are equal, so the last write wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::engine::Fingerprint;
use crate::model::{Candidate, ClassRef};

/// Thread-safe memo table for resolution results.
#[derive(Debug, Default)]
pub struct ReflectCache {
    /// Fingerprint → matched candidates
    results: RwLock<FxHashMap<Fingerprint, Arc<[Candidate]>>>,
    /// (host identity, class name) → loaded class
    classes: RwLock<FxHashMap<(u64, String), ClassRef>>,
    /// host identity → every class name the host lists
    class_names: RwLock<FxHashMap<u64, Arc<[String]>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Snapshot of the cache counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl ReflectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a resolved result, counting the hit or miss.
    pub fn get(&self, key: &Fingerprint) -> Option<Arc<[Candidate]>> {
        let found = self.results.read().get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a result. Empty results are never cached.
    pub fn put(&self, key: Fingerprint, found: Arc<[Candidate]>) {
        if found.is_empty() {
            return;
        }
        self.results.write().insert(key, found);
    }

    pub(crate) fn class(&self, host: u64, name: &str) -> Option<ClassRef> {
        self.classes.read().get(&(host, name.to_string())).cloned()
    }

    pub(crate) fn put_class(&self, host: u64, class: ClassRef) {
        self.classes.write().insert((host, class.name.clone()), class);
    }

    pub(crate) fn class_names(&self, host: u64) -> Option<Arc<[String]>> {
        self.class_names.read().get(&host).cloned()
    }

    pub(crate) fn put_class_names(&self, host: u64, names: Arc<[String]>) {
        self.class_names.write().insert(host, names);
    }

    /// Drop every cached entry and reset the counters.
    pub fn clear(&self) {
        self.results.write().clear();
        self.classes.write().clear();
        self.class_names.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.results.read().len(),
        }
    }
}
