//! Rate limiter coordination logic.
//!
//! The rate limiter owns the shared permit pool and the background task that
//! refills it once per window. Admission is a non-blocking decision: either a
//! permit is available right now or the caller is told to come back later.

use crate::application::metrics::Metrics;
use crate::application::refill::{RefillHandle, RefillTask, ShutdownError};
use crate::domain::permits::{PermitPolicy, PermitPool, Ticket};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio_util::sync::DropGuard;

/// Error returned when rate limiter configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The request limit must be positive
    #[error("request limit must be greater than 0")]
    ZeroRequestLimit,
    /// The window period must be positive
    #[error("period must be greater than 0")]
    ZeroPeriod,
    /// The request limit exceeds what the permit pool can track
    #[error("request limit must be at most {max}")]
    RequestLimitTooLarge { max: u32 },
    /// The refill task needs a tokio runtime to run on
    #[error("rate limiter must be created inside a tokio runtime")]
    NoRuntime,
    /// The runtime was built without `enable_time`
    #[error("tokio runtime has timers disabled; build it with `enable_time`")]
    TimerDisabled,
}

/// Configuration for a rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    period: Duration,
    request_limit: NonZeroU32,
    policy: PermitPolicy,
}

impl RateLimitConfig {
    /// Allow `request_limit` submissions per `period`.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroRequestLimit` if `request_limit` is zero,
    /// `ConfigError::RequestLimitTooLarge` above [`PermitPool::MAX_CAPACITY`]
    /// and `ConfigError::ZeroPeriod` if `period` is zero.
    pub fn new(period: Duration, request_limit: u32) -> Result<Self, ConfigError> {
        let request_limit = NonZeroU32::new(request_limit).ok_or(ConfigError::ZeroRequestLimit)?;
        if request_limit.get() > PermitPool::MAX_CAPACITY {
            return Err(ConfigError::RequestLimitTooLarge {
                max: PermitPool::MAX_CAPACITY,
            });
        }
        if period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self {
            period,
            request_limit,
            policy: PermitPolicy::default(),
        })
    }

    /// Set how permits return to the pool.
    pub fn with_policy(mut self, policy: PermitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Get the window length.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Get the number of permits per window.
    pub fn request_limit(&self) -> u32 {
        self.request_limit.get()
    }

    /// Get the permit policy.
    pub fn policy(&self) -> PermitPolicy {
        self.policy
    }
}

/// A permit held for the duration of one call.
///
/// Dropping the permit applies the limiter's policy: under
/// [`PermitPolicy::Concurrency`] the permit goes back to the pool, under
/// [`PermitPolicy::PerWindow`] it stays consumed until the next refill.
///
/// Under `Concurrency` a live permit survives refills: the pool only gets it
/// back when the permit is dropped.
#[derive(Debug)]
#[must_use = "dropping a permit immediately ends the call it was meant to guard"]
pub struct Permit {
    pool: Arc<PermitPool>,
    ticket: Option<Ticket>,
}

impl Permit {
    /// Apply the policy now. Returns `true` if the permit went back to the pool.
    pub fn release(mut self) -> bool {
        match self.ticket.take() {
            Some(ticket) if ticket.is_held() => self.pool.release(ticket),
            Some(ticket) => {
                self.pool.retire(ticket);
                false
            }
            None => false,
        }
    }

    /// Keep the permit consumed until the next refill, whatever the policy.
    pub fn forget(mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.pool.retire(ticket);
        }
    }

    /// Window generation the permit was issued in.
    pub fn generation(&self) -> Option<u32> {
        self.ticket.as_ref().map(Ticket::generation)
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            if ticket.is_held() {
                self.pool.release(ticket);
            } else {
                self.pool.retire(ticket);
            }
        }
    }
}

/// Global admission control for submissions.
///
/// Cloning is cheap and every clone shares the same pool. The refill task
/// stops when [`RateLimiter::shutdown`] is called or the last clone is dropped.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    pool: Arc<PermitPool>,
    config: RateLimitConfig,
    metrics: Metrics,
    refill: RefillTask,
    refill_handle: Mutex<Option<RefillHandle>>,
    _stop_on_drop: DropGuard,
}

impl RateLimiter {
    /// Create a full rate limiter and start its refill task on the current
    /// tokio runtime.
    ///
    /// # Errors
    /// Returns `ConfigError::NoRuntime` when called outside a tokio runtime
    /// and `ConfigError::TimerDisabled` when that runtime has no timers.
    pub fn new(config: RateLimitConfig) -> Result<Self, ConfigError> {
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        Self::with_runtime(config, &runtime)
    }

    /// Create a rate limiter whose refill task runs on `runtime`.
    ///
    /// # Errors
    /// Returns `ConfigError::TimerDisabled` when `runtime` has no timers.
    pub fn with_runtime(config: RateLimitConfig, runtime: &Handle) -> Result<Self, ConfigError> {
        Self::with_metrics(config, runtime, Metrics::new())
    }

    pub(crate) fn with_metrics(
        config: RateLimitConfig,
        runtime: &Handle,
        metrics: Metrics,
    ) -> Result<Self, ConfigError> {
        let pool = Arc::new(PermitPool::new(config.request_limit));
        let refill = RefillTask::new(Arc::clone(&pool), config.period, metrics.clone());
        let handle = refill.clone().spawn(runtime)?;
        let stop_on_drop = handle.cancellation_token().drop_guard();

        tracing::debug!(
            request_limit = config.request_limit(),
            period_ms = config.period.as_millis() as u64,
            policy = ?config.policy,
            "rate limiter started"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                pool,
                config,
                metrics,
                refill,
                refill_handle: Mutex::new(Some(handle)),
                _stop_on_drop: stop_on_drop,
            }),
        })
    }

    /// Take a permit if one is available. Never blocks.
    ///
    /// The permit is consumed until the next refill. Use
    /// [`RateLimiter::try_acquire_permit`] to hand it back on completion.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_permit().map(Permit::forget).is_some()
    }

    /// Take a permit guard if one is available. Never blocks.
    pub fn try_acquire_permit(&self) -> Option<Permit> {
        let ticket = if self.inner.config.policy.releases_on_completion() {
            self.inner.pool.try_acquire_held()
        } else {
            self.inner.pool.try_acquire()
        };
        match ticket {
            Some(ticket) => {
                self.inner.metrics.record_admitted();
                tracing::trace!(available = self.inner.pool.available(), "permit acquired");
                Some(Permit {
                    pool: Arc::clone(&self.inner.pool),
                    ticket: Some(ticket),
                })
            }
            None => {
                self.inner.metrics.record_throttled();
                None
            }
        }
    }

    /// Refill the pool immediately. Returns the number of permits restored.
    pub fn refill_now(&self) -> u32 {
        self.inner.refill.refill_once()
    }

    /// Permits available right now.
    pub fn available(&self) -> u32 {
        self.inner.pool.available()
    }

    /// Get the pool capacity, i.e. the configured request limit.
    pub fn capacity(&self) -> u32 {
        self.inner.pool.capacity()
    }

    /// Get the number of live permits under the concurrency policy.
    pub fn in_flight(&self) -> u32 {
        self.inner.pool.in_flight()
    }

    /// Get the permit policy.
    pub fn policy(&self) -> PermitPolicy {
        self.inner.config.policy
    }

    /// Get the window length.
    pub fn period(&self) -> Duration {
        self.inner.config.period
    }

    /// Get the configuration this limiter was built from.
    pub fn config(&self) -> &RateLimitConfig {
        &self.inner.config
    }

    /// Get the shared admission and outcome counters.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// Stop the refill task and wait for it to exit.
    ///
    /// Permits are no longer restored afterwards. Calling this more than once
    /// is a no-op.
    ///
    /// # Errors
    /// Returns `ShutdownError` if the refill task panicked.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        let handle = self
            .inner
            .refill_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.shutdown().await?;
        }
        Ok(())
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.inner.config)
            .field("available", &self.inner.pool.available())
            .finish()
    }
}
