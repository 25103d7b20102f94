//! Cache Store Module
//!
//! Entry storage combining a HashMap with LRU tracking, size accounting and
//! statistics publication.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheCounters, CacheEntry, CacheStatistics, ImageHandle, LruTracker};

// == Cache Store ==
/// Image entry storage with LRU eviction under size and count limits.
///
/// Every method is synchronous. Callers wrap the store in a mutex and never
/// hold the guard across an await point.
#[derive(Debug)]
pub struct CacheStore {
    /// Identifier -> entry
    entries: HashMap<String, CacheEntry>,
    /// Recency order
    lru: LruTracker,
    /// Running hit/miss/eviction counters
    counters: CacheCounters,
    /// Sum of entry sizes in bytes
    total_size: u64,
    /// Maximum aggregate size in bytes
    max_size: u64,
    /// Maximum number of entries
    max_entries: usize,
    /// Latest snapshot, republished after every mutation
    publisher: watch::Sender<CacheStatistics>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `max_size` - Maximum aggregate size in bytes
    /// * `max_entries` - Maximum number of entries
    pub fn new(max_size: u64, max_entries: usize) -> Self {
        let (publisher, _) = watch::channel(CacheStatistics::default());
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            counters: CacheCounters::default(),
            total_size: 0,
            max_size,
            max_entries,
            publisher,
        }
    }

    // == Get ==
    /// Returns the cached handle, recording a hit or a miss.
    ///
    /// A hit refreshes recency and bumps the entry's access count.
    pub fn get(&mut self, id: &str) -> Option<ImageHandle> {
        let handle = match self.entries.get_mut(id) {
            Some(entry) => {
                entry.touch();
                self.lru.touch(id);
                self.counters.record_hit();
                debug!(id, access_count = entry.access_count, "cache hit");
                Some(entry.handle.clone())
            }
            None => {
                self.counters.record_miss();
                None
            }
        };
        self.publish();
        handle
    }

    // == Contains ==
    /// Presence check that leaves recency and counters untouched.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns an entry without touching its recency.
    pub fn peek(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    // == Insert ==
    /// Stores a fresh entry, then enforces the limits.
    ///
    /// Any previous entry for `id` is replaced and its size released first.
    pub fn insert(&mut self, id: String, handle: ImageHandle, size: u64) {
        if let Some(previous) = self.entries.remove(&id) {
            self.total_size -= previous.size;
        }

        self.lru.touch(&id);
        self.total_size += size;
        self.entries
            .insert(id.clone(), CacheEntry::new(id, handle, size));

        self.enforce_limits();
        self.publish();
    }

    // == Remove ==
    /// Deletes an entry. Returns false if it was absent.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.remove_entry(id);
        if removed {
            self.publish();
        }
        removed
    }

    // == Clear ==
    /// Drops every entry and resets all counters to zero.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.total_size = 0;
        self.counters = CacheCounters::default();
        self.publish();
    }

    // == Configure Limits ==
    /// Replaces both limits and evicts immediately if they are now exceeded.
    pub fn configure_limits(&mut self, max_size: u64, max_entries: usize) {
        self.max_size = max_size;
        self.max_entries = max_entries;
        self.enforce_limits();
        self.publish();
    }

    // == Sweep Idle ==
    /// Removes entries unused for longer than `max_age`.
    ///
    /// Not counted as evictions. Returns the number of entries removed.
    pub fn sweep_idle(&mut self, now: Instant, max_age: Duration) -> usize {
        let idle: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_idle(now, max_age))
            .map(|entry| entry.id.clone())
            .collect();

        for id in &idle {
            self.remove_entry(id);
        }

        if !idle.is_empty() {
            self.publish();
        }
        idle.len()
    }

    // == Statistics ==
    /// Derives a fresh statistics snapshot.
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics::snapshot(self.entries.values(), self.total_size, &self.counters)
    }

    /// Subscribes to the snapshot republished after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<CacheStatistics> {
        self.publisher.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn limits(&self) -> (u64, usize) {
        (self.max_size, self.max_entries)
    }

    // == Eviction ==
    /// Evicts least recently used entries until both limits hold.
    fn enforce_limits(&mut self) {
        while self.total_size > self.max_size || self.entries.len() > self.max_entries {
            let Some(oldest) = self.lru.peek_oldest().map(str::to_string) else {
                break;
            };
            self.remove_entry(&oldest);
            self.counters.record_eviction();
            debug!(
                id = %oldest,
                total_size = self.total_size,
                entries = self.entries.len(),
                "evicted least recently used entry"
            );
        }
    }

    fn remove_entry(&mut self, id: &str) -> bool {
        match self.entries.remove(id) {
            Some(entry) => {
                self.lru.remove(id);
                self.total_size -= entry.size;
                true
            }
            None => false,
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.statistics());
    }
}
