use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use stats_core::Clock;
use std::sync::Arc;

/// Per-kind TTLs, chosen to match the volatility of each data kind.
pub const QUOTE_TTL_SECS: i64 = 60;
pub const METRIC_TTL_SECS: i64 = 6 * 60 * 60;
pub const CANDLE_TTL_SECS: i64 = 2 * 60 * 60;
pub const DATASET_TTL_SECS: i64 = 10 * 60;

struct CacheEntry<T> {
    value: T,
    cached_at: DateTime<Utc>,
}

/// Time-boxed cache for one data kind. A hit younger than the TTL
/// short-circuits any fetch; an expired or absent entry is a miss.
/// Entries are only ever superseded or expired, never evicted, so the
/// map grows with the key universe for the process lifetime.
pub struct TtlCache<T: Clone> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(ttl_secs),
            clock,
        }
    }

    /// Returns the cached value, or `None` on absent/expired entries.
    /// Never returns a value as old as the TTL or older.
    pub fn get(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        if self.clock.now() - entry.cached_at >= self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Insert or silently overwrite.
    pub fn insert(&self, key: impl Into<String>, value: T) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                cached_at: self.clock.now(),
            },
        );
    }

    /// True when the key is present but past its TTL.
    pub fn is_expired(&self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(entry) => self.clock.now() - entry.cached_at >= self.ttl,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
