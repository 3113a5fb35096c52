//! Analysis Cache Port
//!
//! Memoization seam for the calling layer. Entries carry an explicit TTL;
//! there is no other eviction contract.

use std::time::Duration;

/// Key/value cache with per-entry TTL
pub trait AnalysisCache<K, V>: Send + Sync {
    /// Value for `key` if present and not expired
    fn get(&self, key: &K) -> Option<V>;

    /// Insert or replace `key`, valid for `ttl`
    fn set(&self, key: K, value: V, ttl: Duration);

    /// Drop every entry
    fn clear(&self);
}
