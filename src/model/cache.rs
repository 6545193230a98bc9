//! Read-through cache for derived bond graphs.
//!
//! A [`BondCache`] holds at most one graph together with the fingerprint of the inputs
//! it was derived from. Lookups with a different fingerprint miss, so a stale graph is
//! never returned after the geometry, the overrides, or the detection parameters change.

use super::topology::BondGraph;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

struct CachedGraph {
    fingerprint: u64,
    graph: Arc<BondGraph>,
}

/// Single-slot cache keyed by a 64-bit input fingerprint.
#[derive(Default)]
pub struct BondCache {
    slot: Mutex<Option<CachedGraph>>,
}

impl BondCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached graph when it was stored under `fingerprint`.
    pub fn lookup(&self, fingerprint: u64) -> Option<Arc<BondGraph>> {
        self.lock()
            .as_ref()
            .filter(|cached| cached.fingerprint == fingerprint)
            .map(|cached| Arc::clone(&cached.graph))
    }

    /// Replaces the cached graph.
    pub fn store(&self, fingerprint: u64, graph: Arc<BondGraph>) {
        *self.lock() = Some(CachedGraph { fingerprint, graph });
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    // A poisoned lock only means another thread panicked mid-store; the slot is either
    // the old or the new complete entry.
    fn lock(&self) -> MutexGuard<'_, Option<CachedGraph>> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clone for BondCache {
    fn clone(&self) -> Self {
        let copy = self.lock().as_ref().map(|cached| CachedGraph {
            fingerprint: cached.fingerprint,
            graph: Arc::clone(&cached.graph),
        });
        Self {
            slot: Mutex::new(copy),
        }
    }
}

impl fmt::Debug for BondCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lock().as_ref() {
            Some(cached) => write!(
                f,
                "BondCache {{ fingerprint: {:#018x}, bonds: {} }}",
                cached.fingerprint,
                cached.graph.bond_count()
            ),
            None => write!(f, "BondCache {{ empty }}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topology::Bond;

    fn graph() -> Arc<BondGraph> {
        Arc::new(BondGraph::from_bonds([0, 1], [Bond::new(0, 1)]))
    }

    #[test]
    fn lookup_misses_on_empty_cache() {
        let cache = BondCache::new();
        assert!(cache.is_empty());
        assert!(cache.lookup(1).is_none());
    }

    #[test]
    fn lookup_hits_with_matching_fingerprint() {
        let cache = BondCache::new();
        let stored = graph();
        cache.store(7, Arc::clone(&stored));

        let hit = cache.lookup(7).unwrap();
        assert!(Arc::ptr_eq(&hit, &stored));
    }

    #[test]
    fn lookup_misses_with_different_fingerprint() {
        let cache = BondCache::new();
        cache.store(7, graph());

        assert!(cache.lookup(8).is_none());
        assert!(!cache.is_empty());
    }

    #[test]
    fn clear_empties_the_slot() {
        let cache = BondCache::new();
        cache.store(7, graph());
        cache.clear();

        assert!(cache.lookup(7).is_none());
    }

    #[test]
    fn clone_shares_the_cached_graph() {
        let cache = BondCache::new();
        cache.store(3, graph());
        let copy = cache.clone();

        assert!(Arc::ptr_eq(&copy.lookup(3).unwrap(), &cache.lookup(3).unwrap()));
    }
}
