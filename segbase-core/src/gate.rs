// segbase-core/src/gate.rs
// Per-collection write serialization

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

/// Registry of per-collection mutexes.
///
/// Mutating operations on one collection name execute one at a time;
/// operations on different names never block each other. Entries are
/// created lazily on first acquire and never pruned - the registry is
/// bounded by the number of distinct collection names used over the
/// store's lifetime. Reads do not go through the gate at all.
pub struct CollectionGate {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CollectionGate {
    pub fn new() -> Self {
        CollectionGate {
            locks: DashMap::new(),
        }
    }

    /// The mutex for a collection name. Callers lock the returned handle
    /// for the duration of their critical section; the RAII guard releases
    /// it on every exit path.
    pub fn acquire(&self, collection: &str) -> Arc<Mutex<()>> {
        let entry = self
            .locks
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(entry.value())
    }
}

impl Default for CollectionGate {
    fn default() -> Self {
        Self::new()
    }
}
