//! Image Cache - an in-memory image loader
//!
//! Fetches remote images, shares one fetch between concurrent requests for
//! the same URL, evicts least recently used entries under size and count
//! limits, retries failures with backoff, warms the cache in the background
//! and reports usage statistics.

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod tasks;

pub use cache::{CacheStatistics, ImageHandle};
pub use config::Config;
pub use error::{FetchError, Result};
pub use loader::{create_optimized_identifier, HttpTransport, ImageCache, ImageTransport};
pub use models::{LoadOptions, LoadResult, Priority, Quality};
pub use tasks::{spawn_sweeper_task, PreloadProgress};
