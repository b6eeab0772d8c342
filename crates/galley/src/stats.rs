//! Counters shared across every task of a pipeline run.

use portable_atomic::{AtomicU64, Ordering};

/// Pipeline-wide counters shared by every requester and worker.
///
/// Counters only ever increase; read them through [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct PipelineStats {
    created: AtomicU64,
    admitted: AtomicU64,
    abandoned: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    completed: AtomicU64,
}

/// A point-in-time copy of [`PipelineStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsSnapshot {
    /// Work items built by requesters.
    pub created: u64,
    /// Items that made it into the admission queue.
    pub admitted: u64,
    /// Admission attempts that timed out.
    pub abandoned: u64,
    /// Replies written by workers, successful or not.
    pub delivered: u64,
    /// Replies that carried a work failure.
    pub failed: u64,
    /// Successful replies consumed by requesters.
    pub completed: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self, success: bool) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            created: self.created.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Every attempt either got admitted or abandoned.
    pub const fn attempts_balance(&self) -> bool {
        self.created == self.admitted + self.abandoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let stats = PipelineStats::new();
        stats.record_created();
        stats.record_created();
        stats.record_abandoned();
        stats.record_admitted();
        stats.record_delivered(false);

        let snapshot = stats.snapshot();
        assert_eq!(
            snapshot,
            StatsSnapshot {
                created: 2,
                admitted: 1,
                abandoned: 1,
                delivered: 1,
                failed: 1,
                completed: 0,
            }
        );
        assert!(snapshot.attempts_balance());
    }
}
