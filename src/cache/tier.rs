//! A single cache tier

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::CacheConfig;
use crate::metrics::CacheMetrics;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.inserted_at.elapsed() >= ttl)
    }
}

/// Concurrent key-value cache with event-driven invalidation.
///
/// Uses `DashMap` so readers and writers on different shards never block
/// each other. A `get` observes any completed `put` on the same key. Entries
/// live until invalidated unless a TTL is configured. A disabled tier accepts
/// writes as no-ops and always misses.
///
/// Every invalidation advances the tier generation. A reader that filled a
/// value from the store passes the generation it saw before the store call to
/// [`put_if_generation`](Self::put_if_generation), so a fetch that raced with
/// an invalidation never writes its stale result back.
pub struct CacheTier<K, V> {
    name: &'static str,
    enabled: bool,
    ttl: Option<Duration>,
    generation: AtomicU64,
    entries: DashMap<K, CacheEntry<V>>,
}

impl<K, V> CacheTier<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a tier; `name` labels its metrics and log events
    pub fn new(name: &'static str, config: &CacheConfig) -> Self {
        Self {
            name,
            enabled: config.enabled,
            ttl: config.ttl_seconds.map(Duration::from_secs),
            generation: AtomicU64::new(0),
            entries: DashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look up a live entry
    pub fn get(&self, key: &K) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.is_expired(self.ttl), entry.value.clone()));

        match lookup {
            Some((false, value)) => {
                CacheMetrics::record_hit(self.name);
                Some(value)
            }
            Some((true, _)) => {
                self.entries
                    .remove_if(key, |_, entry| entry.is_expired(self.ttl));
                CacheMetrics::record_miss(self.name);
                None
            }
            None => {
                CacheMetrics::record_miss(self.name);
                None
            }
        }
    }

    /// Insert or replace an entry
    pub fn put(&self, key: K, value: V) {
        if !self.enabled {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Current invalidation generation; read it before querying the store
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Insert unless the tier was invalidated since `generation` was read.
    ///
    /// Returns whether the value was stored. The check runs under the shard
    /// lock, so an invalidation either refuses this write or removes it.
    pub fn put_if_generation(&self, key: K, value: V, generation: u64) -> bool {
        if !self.enabled {
            return false;
        }

        let entry = self.entries.entry(key);
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(tier = self.name, "Discarding fill that raced an invalidation");
            return false;
        }

        entry.insert(CacheEntry {
            value,
            inserted_at: Instant::now(),
        });
        true
    }

    /// Remove one entry; returns whether it was present
    pub fn invalidate(&self, key: &K) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let removed = self.entries.remove(key).is_some();
        CacheMetrics::record_invalidated(self.name, usize::from(removed));
        removed
    }

    /// Remove every entry whose key matches `predicate`; returns how many were removed
    pub fn invalidate_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&K) -> bool,
    {
        self.generation.fetch_add(1, Ordering::SeqCst);

        // Collect first: removing while iterating would deadlock on the shard lock
        let keys: Vec<K> = self
            .entries
            .iter()
            .filter(|entry| predicate(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        let removed = keys
            .iter()
            .filter(|key| self.entries.remove(key).is_some())
            .count();
        CacheMetrics::record_invalidated(self.name, removed);
        removed
    }

    /// Remove every entry; returns how many were removed
    pub fn clear(&self) -> usize {
        self.invalidate_where(|_| true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
