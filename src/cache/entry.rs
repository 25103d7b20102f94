//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with access bookkeeping.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::cache::ImageHandle;

// == Cache Entry ==
/// Represents a single cached image with its metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Resource identifier (URL)
    pub id: String,
    /// The cached image
    pub handle: ImageHandle,
    /// Estimated size in bytes
    pub size: u64,
    /// Creation time (wall clock, reported in statistics)
    pub created_at: DateTime<Utc>,
    /// Last access (monotonic, drives LRU and idle age)
    pub last_accessed: Instant,
    /// Number of cache hits served by this entry
    pub access_count: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a fresh entry stamped with the current time.
    ///
    /// # Arguments
    /// * `id` - The resource identifier
    /// * `handle` - The decoded image
    /// * `size` - Estimated size in bytes
    pub fn new(id: String, handle: ImageHandle, size: u64) -> Self {
        Self {
            id,
            handle,
            size,
            created_at: Utc::now(),
            last_accessed: Instant::now(),
            access_count: 0,
        }
    }

    // == Touch ==
    /// Records an access.
    ///
    /// The last-access instant never moves backwards.
    pub fn touch(&mut self) {
        let now = Instant::now();
        if now > self.last_accessed {
            self.last_accessed = now;
        }
        self.access_count += 1;
    }

    // == Idle Time ==
    /// Returns how long the entry has gone without access.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_accessed)
    }

    /// Checks if the entry has been idle for longer than `max_age`.
    pub fn is_idle(&self, now: Instant, max_age: Duration) -> bool {
        self.idle_for(now) > max_age
    }
}
