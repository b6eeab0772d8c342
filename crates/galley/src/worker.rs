//! Worker side of the pipeline: take admitted items, run the work function,
//! reply.

use crate::{AdmissionQueue, PipelineStats, Work, WorkFailure, WorkItem};
use core::any::Any;
use futures::FutureExt;
use std::{panic::AssertUnwindSafe, sync::Arc};

/// What a worker did before it terminated.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkerReport {
    pub name: Arc<str>,
    /// Items taken from the queue and replied to.
    pub processed: u64,
    /// Of those, items whose work function failed.
    pub failed: u64,
    /// Replies nobody was waiting for anymore.
    pub undeliverable: u64,
}

/// Worker task responsible for processing [`WorkItem`]s.
///
/// The worker pulls items from the shared [`AdmissionQueue`] in arrival
/// order, runs `work` on each one, and writes the outcome into the item's
/// reply slot. It keeps going until the queue is closed and drained, then
/// returns a [`WorkerReport`].
///
/// This function is designed to be spawned as a Tokio task.
///
/// # Arguments
///
/// - `name`: Worker name, recorded as `processed_by` on every item.
/// - `queue`: Admission queue shared with every requester and worker.
/// - `work`: The work function to run per item.
/// - `stats`: Shared pipeline counters.
///
/// # Behavior
///
/// - A failed work outcome is delivered to the requester as a failure; the
///   loop continues.
/// - A panic inside the work function is caught and delivered as a
///   [`WorkFailure`]; the loop continues.
/// - A reply nobody is waiting for is logged and counted; the loop continues.
/// - Termination is driven solely by queue closure: an item that was dequeued
///   is always finished.
pub async fn worker_loop<W: Work>(
    name: Arc<str>,
    queue: Arc<AdmissionQueue<WorkItem>>,
    work: Arc<W>,
    stats: Arc<PipelineStats>,
) -> WorkerReport {
    #[cfg(feature = "tracing")]
    tracing::info!(worker = %name, "Worker starting");

    let mut report = WorkerReport {
        name: Arc::clone(&name),
        processed: 0,
        failed: 0,
        undeliverable: 0,
    };

    while let Some(item) = queue.dequeue().await {
        let _id = item.id();
        let outcome = match AssertUnwindSafe(work.perform(&name, &item))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => Err(WorkFailure::new(format!(
                "work panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };
        let success = outcome.is_ok();

        #[cfg(feature = "tracing")]
        {
            match &outcome {
                Ok(()) => tracing::debug!(worker = %name, item = %_id, "Item finished"),
                Err(failure) => {
                    tracing::warn!(worker = %name, item = %_id, reason = %failure.reason, "Item failed");
                }
            }
        }

        report.processed += 1;
        if !success {
            report.failed += 1;
        }

        match item.complete(Arc::clone(&name), outcome) {
            Ok(()) => stats.record_delivered(success),
            Err(_delivery) => {
                report.undeliverable += 1;
                #[cfg(feature = "tracing")]
                tracing::error!(
                    worker = %name,
                    item = %_id,
                    requester = %_delivery.requester,
                    "Requester stopped waiting for its reply"
                );
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::info!(
        worker = %name,
        processed = report.processed,
        "Worker stopped: queue closed and drained"
    );

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
