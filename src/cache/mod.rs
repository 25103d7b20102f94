//! Cache Module
//!
//! In-memory image entry storage with LRU eviction under size and count
//! limits, plus statistics derivation.

mod entry;
mod handle;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use handle::ImageHandle;
pub use lru::LruTracker;
pub use stats::{CacheCounters, CacheStatistics};
pub use store::CacheStore;
