//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use url::Url;

/// Image cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum aggregate size of cached entries in bytes
    pub max_size: u64,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Per-attempt fetch deadline when a request does not override it
    pub default_timeout: Duration,
    /// Retry budget when a request does not override it
    pub default_retries: u32,
    /// Backoff unit; attempt `n` waits `n * retry_base_delay`
    pub retry_base_delay: Duration,
    /// Interval between idle sweeps
    pub sweep_interval: Duration,
    /// Entries unused for longer than this are removed by the sweeper
    pub max_idle_age: Duration,
    /// Pause between items processed by the preload queue
    pub preload_delay: Duration,
    /// Origin of the embedding page, used to decide credentials mode
    pub origin: Option<Url>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `IMAGE_CACHE_MAX_SIZE` - Maximum total size in bytes (default: 100 MiB)
    /// - `IMAGE_CACHE_MAX_ENTRIES` - Maximum entries (default: 100)
    /// - `IMAGE_CACHE_TIMEOUT_MS` - Per-attempt timeout (default: 10000)
    /// - `IMAGE_CACHE_RETRIES` - Retry budget (default: 3)
    /// - `IMAGE_CACHE_RETRY_DELAY_MS` - Backoff unit (default: 1000)
    /// - `IMAGE_CACHE_SWEEP_INTERVAL_MS` - Idle sweep interval (default: 300000)
    /// - `IMAGE_CACHE_MAX_IDLE_MS` - Idle age threshold (default: 1800000)
    /// - `IMAGE_CACHE_PRELOAD_DELAY_MS` - Preload pacing (default: 100)
    /// - `IMAGE_CACHE_ORIGIN` - Page origin URL (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: parse_var("IMAGE_CACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            max_entries: parse_var("IMAGE_CACHE_MAX_ENTRIES").unwrap_or(defaults.max_entries),
            default_timeout: parse_var("IMAGE_CACHE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.default_timeout),
            default_retries: parse_var("IMAGE_CACHE_RETRIES").unwrap_or(defaults.default_retries),
            retry_base_delay: parse_var("IMAGE_CACHE_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            sweep_interval: parse_var("IMAGE_CACHE_SWEEP_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.sweep_interval),
            max_idle_age: parse_var("IMAGE_CACHE_MAX_IDLE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_idle_age),
            preload_delay: parse_var("IMAGE_CACHE_PRELOAD_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.preload_delay),
            origin: env::var("IMAGE_CACHE_ORIGIN")
                .ok()
                .and_then(|v| Url::parse(&v).ok()),
        }
    }

    /// Returns a copy with the given page origin.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: 100 * 1024 * 1024,
            max_entries: 100,
            default_timeout: Duration::from_millis(10_000),
            default_retries: 3,
            retry_base_delay: Duration::from_millis(1_000),
            sweep_interval: Duration::from_millis(300_000),
            max_idle_age: Duration::from_millis(1_800_000),
            preload_delay: Duration::from_millis(100),
            origin: None,
        }
    }
}
