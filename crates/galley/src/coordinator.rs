//! Startup and shutdown orchestration.
//!
//! The [`Coordinator`] owns the lifecycle of one pipeline run:
//!
//! 1. Start every worker, so no early admission goes unserved.
//! 2. Start every requester.
//! 3. Wait for *all* requesters to terminate.
//! 4. Close the admission queue.
//! 5. Wait for the workers to drain the queue and stop.
//!
//! Closing only after the last requester is gone means no requester can ever
//! observe a closed queue mid-attempt.

use crate::{
    AdmissionQueue, Error, IdCounter, ItemFactory, PipelineConfig, PipelineStats, RequesterContext,
    RequesterReport, Result, Simulator, StatsSnapshot, Work, WorkerReport, requester_loop,
    worker_loop,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

/// Summary of a finished pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShutdownReport {
    pub stats: StatsSnapshot,
    /// Highest simultaneous queue occupancy observed.
    pub high_water_mark: usize,
    pub capacity: usize,
    pub requesters: Vec<RequesterReport>,
    pub workers: Vec<WorkerReport>,
}

/// Runs requesters and workers around a shared [`AdmissionQueue`].
pub struct Coordinator<W: Work> {
    config: PipelineConfig,
    work: Arc<W>,
    simulator: Simulator,
    shutdown: CancellationToken,
}

impl<W: Work> Coordinator<W> {
    /// Creates a coordinator for `config` whose workers run `work`.
    ///
    /// Requester pauses (consuming a reply, recovering from an abandon) are
    /// drawn by a default [`Simulator`]; see [`with_simulator`](Self::with_simulator).
    pub fn new(config: PipelineConfig, work: W) -> Self {
        Self {
            config,
            work: Arc::new(work),
            simulator: Simulator::default(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Replaces the simulator used for requester pauses.
    #[must_use]
    pub fn with_simulator(mut self, simulator: Simulator) -> Self {
        self.simulator = simulator;
        self
    }

    /// Token that asks requesters to stop building new items.
    ///
    /// Cancelling it does not interrupt anything in flight: admitted items are
    /// still served and the usual close-then-drain shutdown follows.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the pipeline to completion.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if the configuration is rejected; nothing is
    ///   started in that case.
    /// - The first requester error, or [`Error::TaskFailed`] for a task that
    ///   panicked outside the work function. These are returned only after
    ///   shutdown has completed.
    pub async fn run(self) -> Result<ShutdownReport> {
        self.config.validate()?;

        let queue = Arc::new(AdmissionQueue::new(self.config.capacity)?);
        let factory = Arc::new(ItemFactory::new(IdCounter::new()));
        let stats = Arc::new(PipelineStats::new());

        #[cfg(feature = "tracing")]
        tracing::info!(
            workers = self.config.workers.len(),
            requesters = self.config.requesters.len(),
            capacity = self.config.capacity,
            "Starting pipeline"
        );

        // === Phase 1: Workers first, idle on the empty queue ===
        let workers: Vec<_> = self
            .config
            .workers
            .iter()
            .map(|name| {
                tokio::spawn(worker_loop(
                    Arc::from(name.as_str()),
                    Arc::clone(&queue),
                    Arc::clone(&self.work),
                    Arc::clone(&stats),
                ))
            })
            .collect();

        // === Phase 2: Requesters ===
        let ctx = RequesterContext {
            queue: Arc::clone(&queue),
            factory,
            stats: Arc::clone(&stats),
            simulator: self.simulator,
            shutdown: self.shutdown.clone(),
            admit_timeout: self.config.admit_timeout,
            completion_target: self.config.completion_target,
            consume_base: self.config.consume_base,
            abandon_base: self.config.abandon_base,
        };
        let requesters: Vec<_> = self
            .config
            .requesters
            .iter()
            .map(|label| tokio::spawn(requester_loop(Arc::from(label.as_str()), ctx.clone())))
            .collect();
        drop(ctx);

        // === Phase 3: Wait for every requester, failed or not ===
        let requester_results = join_all(requesters).await;

        let mut first_error = None;
        let mut requester_reports = Vec::with_capacity(requester_results.len());
        for (label, joined) in self.config.requesters.iter().zip(requester_results) {
            match flatten(label, joined) {
                Ok(report) => requester_reports.push(report),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(requester = %label, "Requester failed: {e}");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        // === Phase 4: Nobody can be mid-admission anymore; close ===
        #[cfg(feature = "tracing")]
        tracing::info!(queued = queue.len(), "All requesters finished, closing admission queue");
        queue.close();

        // === Phase 5: Workers drain what is left and stop ===
        let worker_results = join_all(workers).await;

        let mut worker_reports = Vec::with_capacity(worker_results.len());
        for (name, joined) in self.config.workers.iter().zip(worker_results) {
            match joined {
                Ok(report) => worker_reports.push(report),
                Err(e) => {
                    let e = task_failed(name, &e);
                    #[cfg(feature = "tracing")]
                    tracing::error!(worker = %name, "Worker failed: {e}");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Pipeline shut down");

        Ok(ShutdownReport {
            stats: stats.snapshot(),
            high_water_mark: queue.high_water_mark(),
            capacity: queue.capacity(),
            requesters: requester_reports,
            workers: worker_reports,
        })
    }
}

fn flatten(
    label: &str,
    joined: core::result::Result<Result<RequesterReport>, JoinError>,
) -> Result<RequesterReport> {
    joined.map_err(|e| task_failed(label, &e))?
}

fn task_failed(task: &str, err: &JoinError) -> Error {
    let context = if err.is_panic() {
        "panicked".to_string()
    } else {
        err.to_string()
    };
    Error::TaskFailed {
        task: task.to_string(),
        context,
    }
}
