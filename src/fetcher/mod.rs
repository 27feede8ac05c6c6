//! Retrying fetcher - cache first, then bounded retries against the backend.

mod retry;

pub use retry::RetryPolicy;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::backend::{self, Backend, Query};
use crate::cache::{CacheKey, Snapshot, TtlStore};
use crate::error::FetchError;
use crate::models::Record;

/// Where a successful result should be cached.
#[derive(Debug, Clone, Copy)]
pub struct CacheSlot<'a> {
    pub key: &'a CacheKey,
    pub ttl: Duration,
}

impl<'a> CacheSlot<'a> {
    pub fn new(key: &'a CacheKey, ttl: Duration) -> Self {
        Self { key, ttl }
    }
}

/// Runs remote reads with a per-attempt timeout and capped backoff.
///
/// Cloning is cheap and shares the same store.
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    store: TtlStore,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(store: TtlStore, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds or the policy gives up.
    ///
    /// With a `slot`, a live cached value is returned without calling
    /// `operation` at all, and a successful result is stored before it is
    /// returned. An attempt that times out is dropped, which cancels it.
    /// Errors that are not transient end the loop early and are returned
    /// as they are; running out of attempts yields `Exhausted`.
    pub async fn fetch<T, F, Fut>(
        &self,
        mut operation: F,
        slot: Option<CacheSlot<'_>>,
    ) -> Result<T, FetchError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        if let Some(slot) = &slot {
            if let Some(cached) = self.store.get::<T>(slot.key) {
                debug!("Cache hit for {}", slot.key);
                return Ok(cached);
            }
            debug!("Cache miss for {}", slot.key);
        }

        let attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match timeout(self.policy.attempt_timeout, operation()).await {
                Ok(Ok(value)) => {
                    if let Some(slot) = &slot {
                        self.store.set(slot.key, value.clone(), slot.ttl);
                    }
                    return Ok(value);
                }
                Ok(Err(err)) => err,
                Err(_) => FetchError::Timeout {
                    attempt,
                    after: self.policy.attempt_timeout,
                },
            };

            if !err.is_transient() {
                warn!("Fetch failed with a permanent error: {}", err);
                return Err(err);
            }
            if attempt >= attempts {
                warn!("Fetch failed after {} attempt(s): {}", attempt, err);
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                "Attempt {}/{} failed ({}), retrying in {:?}",
                attempt, attempts, err, delay
            );
            sleep(delay).await;
        }
    }
}

/// Operation reading `query` from `backend` as a live snapshot of `T`.
pub fn remote_read<T: Record>(
    backend: &Arc<dyn Backend>,
    query: &Query,
) -> impl FnMut() -> BoxFuture<'static, Result<Snapshot<T>, FetchError>> + Send + use<T> {
    let backend = Arc::clone(backend);
    let query = query.clone();
    move || {
        let source = Arc::clone(&backend);
        let query = query.clone();
        async move {
            let rows = source.fetch(&query).await?;
            backend::decode::<T>(rows).map(Snapshot::live)
        }
        .boxed()
    }
}
