//! In-flight request ledger
//!
//! Tracks fetches that have started but not settled so duplicate loads join
//! the pending one instead of issuing a second fetch.

use std::collections::HashMap;

use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::Result;
use crate::models::{LoadOptions, LoadResult};

/// Future every joined caller awaits
pub type SharedFetch = Shared<BoxFuture<'static, Result<LoadResult>>>;

/// A pending fetch
#[derive(Clone)]
pub struct InFlightRequest {
    pub id: String,
    pub future: SharedFetch,
    pub started_at: Instant,
    /// Options the fetch was started with
    pub options: LoadOptions,
}

// == In-Flight Ledger ==
#[derive(Default)]
pub struct InFlightLedger {
    pending: Mutex<HashMap<String, InFlightRequest>>,
}

impl InFlightLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // == Join Or Begin ==
    /// Returns the pending fetch for `id`, or starts one.
    ///
    /// Lookup and registration happen under one lock, so two callers can
    /// never both start a fetch for the same identifier. The boolean is true
    /// when this call started the fetch. `start` runs under the lock and may
    /// decline with `Err`, which is passed through and registers nothing.
    pub fn join_or_begin<F, E>(
        &self,
        id: &str,
        options: &LoadOptions,
        start: F,
    ) -> std::result::Result<(SharedFetch, bool), E>
    where
        F: FnOnce() -> std::result::Result<SharedFetch, E>,
    {
        let mut pending = self.pending.lock();
        if let Some(request) = pending.get(id) {
            return Ok((request.future.clone(), false));
        }

        let future = start()?;
        pending.insert(
            id.to_string(),
            InFlightRequest {
                id: id.to_string(),
                future: future.clone(),
                started_at: Instant::now(),
                options: options.clone(),
            },
        );
        Ok((future, true))
    }

    /// Returns the pending fetch for `id`, if any.
    #[cfg(test)]
    fn join(&self, id: &str) -> Option<SharedFetch> {
        self.pending.lock().get(id).map(|r| r.future.clone())
    }

    #[cfg(test)]
    fn get(&self, id: &str) -> Option<InFlightRequest> {
        self.pending.lock().get(id).cloned()
    }

    // == Settle ==
    /// Forgets the request for `id` once its fetch has completed.
    pub fn settle(&self, id: &str) {
        self.pending.lock().remove(id);
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.lock().contains_key(id)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.pending.lock().len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

/// Settles a ledger entry when dropped, whether the fetch succeeded, failed
/// or panicked.
pub struct SettleGuard<'a> {
    ledger: &'a InFlightLedger,
    id: &'a str,
}

impl<'a> SettleGuard<'a> {
    pub fn new(ledger: &'a InFlightLedger, id: &'a str) -> Self {
        Self { ledger, id }
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        self.ledger.settle(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ImageHandle;
    use futures::FutureExt;
    use image::DynamicImage;
    use std::time::Duration;

    /// Start closure result for callers that always begin a fetch
    type Begin = std::result::Result<SharedFetch, ()>;

    fn ready_fetch(id: &str) -> SharedFetch {
        let result = LoadResult::fetched(
            id,
            ImageHandle::new(DynamicImage::new_rgba8(1, 1)),
            4,
            Duration::from_millis(5),
        );
        async move { Ok(result) }.boxed().shared()
    }

    #[test]
    fn test_second_caller_joins() {
        let ledger = InFlightLedger::new();
        let options = LoadOptions::default();
        let mut starts = 0;

        let (_, first_leads) = ledger
            .join_or_begin("a", &options, || -> Begin {
                starts += 1;
                Ok(ready_fetch("a"))
            })
            .unwrap();
        let (_, second_leads) = ledger
            .join_or_begin("a", &options, || -> Begin {
                starts += 1;
                Ok(ready_fetch("a"))
            })
            .unwrap();

        assert!(first_leads);
        assert!(!second_leads);
        assert_eq!(starts, 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_join_and_settle() {
        let ledger = InFlightLedger::new();
        assert!(ledger.join("a").is_none());

        ledger
            .join_or_begin("a", &LoadOptions::default(), || -> Begin { Ok(ready_fetch("a")) })
            .unwrap();
        assert!(ledger.join("a").is_some());
        assert!(ledger.is_pending("a"));

        ledger.settle("a");
        assert!(!ledger.is_pending("a"));
        assert!(ledger.is_empty());

        // settling twice is harmless
        ledger.settle("a");
    }

    #[test]
    fn test_request_keeps_options() {
        let ledger = InFlightLedger::new();
        let options = LoadOptions::new().with_retries(5);

        ledger
            .join_or_begin("a", &options, || -> Begin { Ok(ready_fetch("a")) })
            .unwrap();

        assert_eq!(ledger.get("a").unwrap().options.retries, Some(5));
    }

    #[test]
    fn test_guard_settles_on_drop() {
        let ledger = InFlightLedger::new();
        ledger
            .join_or_begin("a", &LoadOptions::default(), || -> Begin { Ok(ready_fetch("a")) })
            .unwrap();

        {
            let _guard = SettleGuard::new(&ledger, "a");
            assert!(ledger.is_pending("a"));
        }

        assert!(!ledger.is_pending("a"));
    }

    #[test]
    fn test_declined_start_registers_nothing() {
        let ledger = InFlightLedger::new();

        let declined = ledger.join_or_begin("a", &LoadOptions::default(), || Err("already cached"));

        assert_eq!(declined.err(), Some("already cached"));
        assert!(!ledger.is_pending("a"));
    }

    #[tokio::test]
    async fn test_joined_callers_share_result() {
        let ledger = InFlightLedger::new();
        let (first, _) = ledger
            .join_or_begin("a", &LoadOptions::default(), || -> Begin { Ok(ready_fetch("a")) })
            .unwrap();
        let second = ledger.join("a").unwrap();

        let (a, b) = futures::join!(first, second);
        assert!(a.unwrap().handle.ptr_eq(&b.unwrap().handle));
    }
}
