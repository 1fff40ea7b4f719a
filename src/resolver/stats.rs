use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Statistics for the template resolver
#[derive(Debug, Default)]
pub struct ResolverStats {
    /// Total resolve calls
    pub lookups: AtomicU64,
    /// Lookups answered by the resolved-template cache
    pub cache_hits: AtomicU64,
    /// Queries issued to the template store
    pub store_queries: AtomicU64,
    /// Lookups answered at the default locale instead of the requested one
    pub locale_fallbacks: AtomicU64,
    /// Lookups that found nothing
    pub not_found: AtomicU64,
}

impl ResolverStats {
    pub fn snapshot(&self) -> ResolverStatsSnapshot {
        ResolverStatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            store_queries: self.store_queries.load(Ordering::Relaxed),
            locale_fallbacks: self.locale_fallbacks.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of resolver statistics
#[derive(Debug, Clone, Serialize)]
pub struct ResolverStatsSnapshot {
    pub lookups: u64,
    pub cache_hits: u64,
    pub store_queries: u64,
    pub locale_fallbacks: u64,
    pub not_found: u64,
}
