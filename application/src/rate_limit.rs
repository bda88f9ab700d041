//! Admission control for outbound model calls
//!
//! Bounds the number of in-flight requests globally and, optionally, per
//! provider. Waiters are admitted in FIFO order by the underlying
//! [`Semaphore`]s; each released slot wakes exactly one waiter.

use crate::context::RunContext;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("Admission cancelled")]
    Cancelled,

    #[error("Admission timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limiter closed")]
    Closed,
}

/// Slot bounds. Zero means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_concurrent: usize,
    #[serde(default)]
    pub provider_limits: HashMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_timeout: Option<Duration>,
}

impl RateLimitConfig {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            ..Default::default()
        }
    }

    pub fn with_provider_limit(mut self, provider: impl Into<String>, limit: usize) -> Self {
        self.provider_limits.insert(provider.into(), limit);
        self
    }

    pub fn with_admission_timeout(mut self, timeout: Duration) -> Self {
        self.admission_timeout = Some(timeout);
        self
    }
}

/// Slots held by one admitted request. Dropping it releases them.
#[derive(Debug)]
pub struct RatePermit {
    _global: Option<OwnedSemaphorePermit>,
    _provider: Option<OwnedSemaphorePermit>,
}

impl RatePermit {
    pub fn release(self) {
        drop(self);
    }
}

pub struct RateLimiter {
    global: Option<Arc<Semaphore>>,
    provider_limits: HashMap<String, usize>,
    providers: Mutex<HashMap<String, Arc<Semaphore>>>,
    admission_timeout: Option<Duration>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let global = (config.max_concurrent > 0)
            .then(|| Arc::new(Semaphore::new(config.max_concurrent)));
        Self {
            global,
            provider_limits: config.provider_limits,
            providers: Mutex::new(HashMap::new()),
            admission_timeout: config.admission_timeout,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(RateLimitConfig::default())
    }

    /// Wait for a slot for `provider`.
    ///
    /// Returns [`RateLimitError::Cancelled`] as soon as the run's token
    /// fires; any slot already taken during this call is given back.
    pub async fn acquire(
        &self,
        ctx: &RunContext,
        provider: &str,
    ) -> Result<RatePermit, RateLimitError> {
        let admission = async {
            match self.admission_timeout {
                Some(limit) => tokio::time::timeout(limit, self.admit(provider))
                    .await
                    .map_err(|_| RateLimitError::Timeout(limit))?,
                None => self.admit(provider).await,
            }
        };

        tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => {
                debug!(provider, "Admission cancelled");
                Err(RateLimitError::Cancelled)
            }
            permit = admission => permit,
        }
    }

    async fn admit(&self, provider: &str) -> Result<RatePermit, RateLimitError> {
        // Provider first: a waiter queued behind a saturated provider must
        // not hold a global slot.
        let provider = match self.provider_semaphore(provider) {
            Some(sem) => Some(sem.acquire_owned().await.map_err(|_| RateLimitError::Closed)?),
            None => None,
        };
        let global = match &self.global {
            Some(sem) => Some(
                Arc::clone(sem)
                    .acquire_owned()
                    .await
                    .map_err(|_| RateLimitError::Closed)?,
            ),
            None => None,
        };

        Ok(RatePermit {
            _global: global,
            _provider: provider,
        })
    }

    fn provider_semaphore(&self, provider: &str) -> Option<Arc<Semaphore>> {
        let limit = self.provider_limits.get(provider).copied().filter(|l| *l > 0)?;
        let mut providers = self.providers.lock().unwrap_or_else(PoisonError::into_inner);
        let sem = providers
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(limit)));
        Some(Arc::clone(sem))
    }

    /// Free global slots, or `None` when unbounded
    pub fn available_global(&self) -> Option<usize> {
        self.global.as_ref().map(|s| s.available_permits())
    }

    /// Free slots for `provider`, or `None` when it has no bound
    pub fn available_for(&self, provider: &str) -> Option<usize> {
        self.provider_semaphore(provider)
            .map(|s| s.available_permits())
    }

    /// Reject all current and future waiters with [`RateLimitError::Closed`]
    pub fn close(&self) {
        if let Some(sem) = &self.global {
            sem.close();
        }
        let providers = self.providers.lock().unwrap_or_else(PoisonError::into_inner);
        for sem in providers.values() {
            sem.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    fn ctx() -> RunContext {
        RunContext::new(CancellationToken::new())
    }

    #[tokio::test]
    async fn test_unbounded_never_waits() {
        let limiter = RateLimiter::unbounded();
        let ctx = ctx();

        let permits: Vec<_> = futures::future::join_all((0..50).map(|_| limiter.acquire(&ctx, "p")))
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(permits.len(), 50);
        assert_eq!(limiter.available_global(), None);
        assert_eq!(limiter.available_for("p"), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_global_bound_is_respected() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::new(2)));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let ctx = ctx();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                let permit = limiter.acquire(&ctx, "p").await.unwrap();
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                permit.release();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(limiter.available_global(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_admitted_in_fifo_order() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::new(1)));
        let order = Arc::new(Mutex::new(Vec::new()));
        let ctx = ctx();

        let held = limiter.acquire(&ctx, "p").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..4 {
            let limiter = Arc::clone(&limiter);
            let order = Arc::clone(&order);
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                let permit = limiter.acquire(&ctx, "p").await.unwrap();
                order.lock().unwrap().push(i);
                permit.release();
            }));
            // Let waiter i enqueue before spawning the next one
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        held.release();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_provider_bound_independent_of_other_providers() {
        let limiter = RateLimiter::new(RateLimitConfig::new(4).with_provider_limit("slow", 1));
        let ctx = ctx();

        let _slow = limiter.acquire(&ctx, "slow").await.unwrap();
        assert_eq!(limiter.available_for("slow"), Some(0));

        // Other providers are only bound globally
        let _fast1 = limiter.acquire(&ctx, "fast").await.unwrap();
        let _fast2 = limiter.acquire(&ctx, "fast").await.unwrap();
        assert_eq!(limiter.available_global(), Some(1));
        assert_eq!(limiter.available_for("fast"), None);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_returns_promptly() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::new(1)));
        let token = CancellationToken::new();
        let ctx = RunContext::new(token.clone());

        let held = limiter.acquire(&ctx, "p").await.unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            let ctx = ctx.clone();
            tokio::spawn(async move { limiter.acquire(&ctx, "p").await })
        };
        tokio::task::yield_now().await;
        token.cancel();

        let result = waiter.await.unwrap();
        assert_eq!(result.unwrap_err(), RateLimitError::Cancelled);

        held.release();
        assert_eq!(limiter.available_global(), Some(1));
    }

    #[tokio::test]
    async fn test_saturated_provider_does_not_starve_others() {
        let limiter = Arc::new(RateLimiter::new(
            RateLimitConfig::new(2).with_provider_limit("slow", 1),
        ));
        let ctx = ctx();

        let held = limiter.acquire(&ctx, "slow").await.unwrap();
        let queued = {
            let limiter = Arc::clone(&limiter);
            let ctx = ctx.clone();
            tokio::spawn(async move { limiter.acquire(&ctx, "slow").await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        // Only one call is in flight, so one global slot is still free
        assert_eq!(limiter.available_global(), Some(1));
        let fast = tokio::time::timeout(Duration::from_millis(200), limiter.acquire(&ctx, "fast"))
            .await
            .expect("fast provider admitted")
            .unwrap();
        assert_eq!(limiter.available_global(), Some(0));

        fast.release();
        held.release();
        let second = queued.await.unwrap().unwrap();
        assert_eq!(limiter.available_for("slow"), Some(0));
        second.release();
        assert_eq!(limiter.available_global(), Some(2));
    }

    #[tokio::test]
    async fn test_cancel_returns_partially_acquired_slots() {
        let limiter = Arc::new(RateLimiter::new(
            RateLimitConfig::new(1).with_provider_limit("p", 2),
        ));
        let token = CancellationToken::new();
        let ctx = RunContext::new(token.clone());

        let held = limiter.acquire(&ctx, "p").await.unwrap();
        assert_eq!(limiter.available_for("p"), Some(1));

        // Takes the last provider slot, then blocks on the global slot
        let waiter = {
            let limiter = Arc::clone(&limiter);
            let ctx = ctx.clone();
            tokio::spawn(async move { limiter.acquire(&ctx, "p").await })
        };
        while limiter.available_for("p") != Some(0) {
            tokio::task::yield_now().await;
        }

        token.cancel();
        assert_eq!(waiter.await.unwrap().unwrap_err(), RateLimitError::Cancelled);
        assert_eq!(limiter.available_for("p"), Some(1));

        held.release();
        assert_eq!(limiter.available_global(), Some(1));
        assert_eq!(limiter.available_for("p"), Some(2));
    }

    #[tokio::test]
    async fn test_already_cancelled_context_is_rejected() {
        let limiter = RateLimiter::new(RateLimitConfig::new(1));
        let token = CancellationToken::new();
        token.cancel();

        let err = limiter
            .acquire(&RunContext::new(token), "p")
            .await
            .unwrap_err();
        assert_eq!(err, RateLimitError::Cancelled);
        assert_eq!(limiter.available_global(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_admission_timeout() {
        let limiter = RateLimiter::new(
            RateLimitConfig::new(1).with_admission_timeout(Duration::from_secs(5)),
        );
        let ctx = ctx();

        let _held = limiter.acquire(&ctx, "p").await.unwrap();
        let err = limiter.acquire(&ctx, "p").await.unwrap_err();
        assert_eq!(err, RateLimitError::Timeout(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_close_rejects_waiters() {
        let limiter = RateLimiter::new(RateLimitConfig::new(1));
        let ctx = ctx();
        let _held = limiter.acquire(&ctx, "p").await.unwrap();

        limiter.close();
        assert_eq!(
            limiter.acquire(&ctx, "p").await.unwrap_err(),
            RateLimitError::Closed
        );
    }
}
