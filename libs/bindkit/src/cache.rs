//! Consumer-side proxy cache.
//!
//! Keyed by [`ConsumerDescriptor`] value equality, so two descriptors that
//! agree on every field hit the same slot regardless of where they were
//! built. The enable flag toggles atomically but never evicts: entries live
//! for the process lifetime and there is no per-entry invalidation.
//!
//! Concurrent misses for the same key may both construct a proxy; the cache
//! only promises that the slot holds *some* valid proxy once stored (last
//! writer wins). Single construction per key is the binding resolver's
//! guarantee, not this cache's.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::contracts::ProxyHandle;
use crate::descriptor::ConsumerDescriptor;

/// Value-keyed store of minted proxies.
pub struct ProxyCache {
    entries: DashMap<ConsumerDescriptor, ProxyHandle>,
    enabled: AtomicBool,
}

impl ProxyCache {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: DashMap::new(),
            enabled: AtomicBool::new(enabled),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Toggle caching. Existing entries are kept either way.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get(&self, descriptor: &ConsumerDescriptor) -> Option<ProxyHandle> {
        self.entries.get(descriptor).map(|entry| entry.clone())
    }

    pub fn store(&self, descriptor: ConsumerDescriptor, proxy: ProxyHandle) {
        self.entries.insert(descriptor, proxy);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProxyCache {
    fn default() -> Self {
        Self::new(true)
    }
}
