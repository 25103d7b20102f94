//! Retrying fetcher
//!
//! Runs the transport under a per-attempt deadline and retries failures with
//! linear backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::cache::ImageHandle;
use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::loader::{create_optimized_identifier, credentials_mode, FetchRequest, ImageTransport};
use crate::models::LoadOptions;

/// Defaults applied when a request leaves a field unset
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub retries: u32,
    /// Attempt `n` is followed by a pause of `n * base_delay`
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.default_timeout,
            retries: config.default_retries,
            base_delay: config.retry_base_delay,
        }
    }

    /// Pause after the given 1-based attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// A successful fetch
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub handle: ImageHandle,
    /// `width * height * 4`
    pub size: u64,
    /// Total time including backoff pauses
    pub elapsed: Duration,
}

// == Retrying Fetcher ==
pub struct RetryingFetcher {
    transport: Arc<dyn ImageTransport>,
    policy: RetryPolicy,
    origin: Option<Url>,
}

impl RetryingFetcher {
    pub fn new(transport: Arc<dyn ImageTransport>, policy: RetryPolicy, origin: Option<Url>) -> Self {
        Self {
            transport,
            policy,
            origin,
        }
    }

    // == Fetch ==
    /// Fetches `id`, retrying up to `options.retries` times.
    ///
    /// Surfaces `Timeout` if the final attempt ran out of time and
    /// `ExhaustedRetries` if it failed in the transport.
    pub async fn fetch(&self, id: &str, options: &LoadOptions) -> Result<FetchOutcome> {
        let request = FetchRequest {
            url: create_optimized_identifier(id, options),
            credentials: credentials_mode(id, self.origin.as_ref()),
            priority: options.priority,
        };
        let deadline = options.timeout.unwrap_or(self.policy.timeout);
        let retries = options.retries.unwrap_or(self.policy.retries);
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match timeout(deadline, self.transport.fetch(&request)).await {
                Ok(Ok(handle)) => {
                    let elapsed = started.elapsed();
                    debug!(id, attempt, ?elapsed, "fetch succeeded");
                    return Ok(FetchOutcome {
                        size: handle.estimated_size(),
                        handle,
                        elapsed,
                    });
                }
                Ok(Err(err)) => FetchError::TransportFailure(format!("{:#}", err)),
                Err(_) => FetchError::Timeout {
                    id: id.to_string(),
                    after: deadline,
                },
            };

            if attempt > retries {
                return Err(match error {
                    FetchError::TransportFailure(last_error) => FetchError::ExhaustedRetries {
                        id: id.to_string(),
                        attempts: attempt,
                        last_error,
                    },
                    other => other,
                });
            }

            let delay = self.policy.backoff(attempt);
            warn!(id, attempt, retries, ?delay, error = %error, "fetch attempt failed, retrying");
            sleep(delay).await;
        }
    }
}
