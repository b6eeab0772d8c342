//! The opaque work function and the pacing used to simulate durations.
//!
//! Workers do not know what processing an item means; they call a [`Work`]
//! implementation and deliver whatever it returns. [`SimulatedWork`] is the
//! stock implementation used by the simulation binary: it blocks the calling
//! task for a randomized duration and, optionally, fails a fraction of items.

use crate::{WorkFailure, WorkItem};
use core::time::Duration;
use rand::Rng;

/// Something a worker runs for each item it dequeues.
///
/// Implementations report failure through the returned [`WorkFailure`]; the
/// worker forwards it to the requester and keeps going.
pub trait Work: Send + Sync + 'static {
    /// Processes `item` on behalf of the worker named `worker`.
    fn perform(
        &self,
        worker: &str,
        item: &WorkItem,
    ) -> impl Future<Output = Result<(), WorkFailure>> + Send;
}

/// Draws and sleeps randomized durations.
///
/// A duration for base `b` is drawn uniformly from `[0.5 * b, 1.5 * b]` and
/// then multiplied by `scale`. A zero base (or zero scale) never sleeps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Simulator {
    scale: f64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Simulator {
    /// Creates a simulator that stretches every drawn duration by `scale`.
    /// Non-finite or negative scales are treated as zero.
    pub fn new(scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            0.0
        };
        Self { scale }
    }

    /// A simulator that never sleeps.
    pub const fn instant() -> Self {
        Self { scale: 0.0 }
    }

    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Draws a duration around `base`.
    pub fn duration(&self, base: Duration) -> Duration {
        if base.is_zero() || self.scale == 0.0 {
            return Duration::ZERO;
        }
        let base = base.as_secs_f64();
        let drawn = rand::rng().random_range(0.5 * base..=1.5 * base);
        Duration::try_from_secs_f64(drawn * self.scale).unwrap_or(Duration::MAX)
    }

    /// Suspends the calling task for a duration drawn around `base`.
    pub async fn pause(&self, base: Duration) {
        let duration = self.duration(base);
        if duration.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(duration).await;
        }
    }
}

/// [`Work`] that takes a randomized amount of time and optionally fails.
#[derive(Clone, Debug)]
pub struct SimulatedWork {
    simulator: Simulator,
    base: Duration,
    failure_rate: f64,
}

impl SimulatedWork {
    /// Work lasting around `base`, scaled by `simulator`, that always
    /// succeeds.
    pub const fn new(simulator: Simulator, base: Duration) -> Self {
        Self {
            simulator,
            base,
            failure_rate: 0.0,
        }
    }

    /// Fails each item with probability `rate`, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    pub const fn failure_rate(&self) -> f64 {
        self.failure_rate
    }
}

impl Work for SimulatedWork {
    fn perform(
        &self,
        worker: &str,
        item: &WorkItem,
    ) -> impl Future<Output = Result<(), WorkFailure>> + Send {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            worker,
            item = %item.id(),
            requester = item.requester(),
            "Processing item"
        );

        let failed = self.failure_rate > 0.0 && rand::rng().random_bool(self.failure_rate);
        let reason = failed.then(|| format!("{worker} could not finish item {}", item.id()));
        let simulator = self.simulator;
        let base = self.base;

        async move {
            simulator.pause(base).await;
            match reason {
                Some(reason) => Err(WorkFailure::new(reason)),
                None => Ok(()),
            }
        }
    }
}
