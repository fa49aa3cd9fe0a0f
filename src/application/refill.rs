//! Periodic refill of the permit pool.
//!
//! A background task restores the pool to full capacity once per window.
//! The first refill happens one full period after the task is spawned, so
//! permits consumed right after construction count against the first window.

use crate::application::limiter::ConfigError;
use crate::application::metrics::Metrics;
use crate::domain::permits::PermitPool;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Error returned when the refill task does not stop cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShutdownError {
    /// The task panicked before it could be stopped
    #[error("refill task panicked")]
    Panicked,
}

/// Refills a permit pool at a fixed period.
#[derive(Debug, Clone)]
pub struct RefillTask {
    pool: Arc<PermitPool>,
    period: Duration,
    metrics: Metrics,
}

impl RefillTask {
    /// Create a refill task. `period` must be non-zero.
    pub fn new(pool: Arc<PermitPool>, period: Duration, metrics: Metrics) -> Self {
        Self {
            pool,
            period,
            metrics,
        }
    }

    /// Run one refill now. Returns the number of permits restored.
    pub fn refill_once(&self) -> u32 {
        let restored = self.pool.refill();
        if restored > 0 {
            self.metrics.record_refill();
            tracing::debug!(
                restored,
                generation = self.pool.generation(),
                capacity = self.pool.capacity(),
                "permit window refilled"
            );
        } else {
            tracing::trace!("permit window already full");
        }
        restored
    }

    /// Spawn the task on `runtime`.
    ///
    /// The ticker is armed before this returns, so the first refill is due
    /// exactly one period from now regardless of when the task is first polled.
    ///
    /// # Errors
    /// Returns `ConfigError::TimerDisabled` if `runtime` was built without
    /// `enable_time`.
    pub fn spawn(self, runtime: &Handle) -> Result<RefillHandle, ConfigError> {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let _guard = runtime.enter();
        let mut ticker = arm_ticker(self.period)?;

        let join = runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        self.refill_once();
                    }
                }
            }
            tracing::debug!("refill task stopped");
        });

        Ok(RefillHandle { cancel, join })
    }
}

/// Create the refill ticker on the entered runtime.
///
/// tokio offers no way to ask whether a runtime has a time driver; creating
/// a timer without one panics, so that panic is turned into an error here.
/// The default panic hook still reports it on stderr.
fn arm_ticker(period: Duration) -> Result<Interval, ConfigError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        interval_at(Instant::now() + period, period)
    }))
    .map(|mut ticker| {
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    })
    .map_err(|_| ConfigError::TimerDisabled)
}

/// Handle to a running refill task.
///
/// Dropping the handle does not stop the task; call [`RefillHandle::cancel`]
/// or [`RefillHandle::shutdown`].
#[derive(Debug)]
pub struct RefillHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl RefillHandle {
    /// Signal the task to stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that stops the task when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stop the task and wait for it to exit.
    ///
    /// # Errors
    /// Returns `ShutdownError::Panicked` if the task panicked.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        self.cancel.cancel();
        match self.join.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_panic() => Err(ShutdownError::Panicked),
            Err(_) => Ok(()),
        }
    }
}
