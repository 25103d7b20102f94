//! Cache Statistics Module
//!
//! Running counters owned by a cache instance, and the derived snapshot
//! published to observers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheEntry;

// == Cache Counters ==
/// Running counters. Reset by `clear`, dropped with the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    /// Pressure evictions only; idle sweeps are not counted here
    pub evictions: u64,
}

impl CacheCounters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }
}

// == Cache Statistics ==
/// Point-in-time view of the cache. Never mutated, always rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStatistics {
    pub total_entries: usize,
    /// Sum of estimated entry sizes in bytes
    pub total_size: u64,
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses), 0 before any request
    pub hit_rate: f64,
    /// misses / (hits + misses), 0 before any request
    pub miss_rate: f64,
    pub evictions: u64,
    /// Creation time of the oldest entry
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Creation time of the newest entry
    pub newest_entry: Option<DateTime<Utc>>,
}

impl CacheStatistics {
    // == Snapshot ==
    /// Derives statistics from the current entries and counters.
    pub fn snapshot<'a>(
        entries: impl Iterator<Item = &'a CacheEntry>,
        total_size: u64,
        counters: &CacheCounters,
    ) -> Self {
        let mut total_entries = 0;
        let mut oldest_entry: Option<DateTime<Utc>> = None;
        let mut newest_entry: Option<DateTime<Utc>> = None;

        for entry in entries {
            total_entries += 1;
            oldest_entry = Some(oldest_entry.map_or(entry.created_at, |t| t.min(entry.created_at)));
            newest_entry = Some(newest_entry.map_or(entry.created_at, |t| t.max(entry.created_at)));
        }

        let (hit_rate, miss_rate) = match counters.requests() {
            0 => (0.0, 0.0),
            total => (
                counters.hits as f64 / total as f64,
                counters.misses as f64 / total as f64,
            ),
        };

        Self {
            total_entries,
            total_size,
            hits: counters.hits,
            misses: counters.misses,
            hit_rate,
            miss_rate,
            evictions: counters.evictions,
            oldest_entry,
            newest_entry,
        }
    }
}
