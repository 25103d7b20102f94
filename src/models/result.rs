//! Load result
//!
//! What a successful load hands back to the caller.

use std::time::Duration;

use crate::cache::ImageHandle;

/// Outcome of a successful load.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// The decoded image
    pub handle: ImageHandle,
    /// Identifier the caller asked for
    pub id: String,
    /// Time spent fetching, including backoff; zero when served from cache
    pub elapsed: Duration,
    /// True if no fetch was issued for this call
    pub from_cache: bool,
    /// Estimated size in bytes
    pub size: u64,
}

impl LoadResult {
    /// Builds the result for a cache hit.
    pub fn cached(id: impl Into<String>, handle: ImageHandle) -> Self {
        let size = handle.estimated_size();
        Self {
            handle,
            id: id.into(),
            elapsed: Duration::ZERO,
            from_cache: true,
            size,
        }
    }

    /// Builds the result for a completed fetch.
    pub fn fetched(id: impl Into<String>, handle: ImageHandle, size: u64, elapsed: Duration) -> Self {
        Self {
            handle,
            id: id.into(),
            elapsed,
            from_cache: false,
            size,
        }
    }
}
