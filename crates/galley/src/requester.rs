//! Requester side of the pipeline.
//!
//! A requester keeps building items until it has consumed enough successful
//! replies, abandoning any item the queue will not take in time.

use crate::{
    AdmissionQueue, EnqueueError, Error, ItemFactory, PipelineStats, Result, Simulator, WorkItem,
};
use core::time::Duration;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared handles and settings a requester runs with.
#[derive(Clone, Debug)]
pub struct RequesterContext {
    pub queue: Arc<AdmissionQueue<WorkItem>>,
    pub factory: Arc<ItemFactory>,
    pub stats: Arc<PipelineStats>,
    pub simulator: Simulator,
    /// Checked before each new item is built. Admitted items are always
    /// waited for.
    pub shutdown: CancellationToken,
    pub admit_timeout: Duration,
    pub completion_target: usize,
    pub consume_base: Duration,
    pub abandon_base: Duration,
}

/// What a requester did before it terminated.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequesterReport {
    pub label: Arc<str>,
    /// Successful replies consumed.
    pub completed: usize,
    /// Attempts that timed out waiting for admission.
    pub abandoned: usize,
    /// Admitted attempts whose work failed.
    pub failed: usize,
    /// `true` if shutdown was requested before the target was reached.
    pub stopped_early: bool,
}

/// Requester task: builds items, gets them admitted, and consumes replies
/// until `completion_target` successful replies have been consumed.
///
/// Each attempt goes Building -> Admitting -> (Waiting | Abandoned):
///
/// - **Admitting** tries the queue for at most `admit_timeout`.
/// - **Waiting** blocks on the reply with no deadline: once admitted, the
///   item is always serviced before the queue closes.
/// - **Abandoned** drops the item, pauses around `abandon_base`, and starts
///   over. Abandoned attempts are unbounded and do not count toward the
///   target.
///
/// A failed reply is counted and retried with a fresh item; it does not count
/// toward the target either.
///
/// # Errors
///
/// - [`Error::ReplyDropped`] if an admitted item's reply slot was dropped
///   unanswered.
/// - [`Error::QueueClosed`] if the queue closed while this requester was still
///   running.
pub async fn requester_loop(label: Arc<str>, ctx: RequesterContext) -> Result<RequesterReport> {
    let mut report = RequesterReport {
        label: Arc::clone(&label),
        completed: 0,
        abandoned: 0,
        failed: 0,
        stopped_early: false,
    };

    while report.completed < ctx.completion_target {
        if ctx.shutdown.is_cancelled() {
            report.stopped_early = true;
            #[cfg(feature = "tracing")]
            tracing::info!(requester = %label, completed = report.completed, "Leaving early");
            break;
        }

        let (item, reply) = ctx.factory.create(&label);
        let _id = item.id();
        ctx.stats.record_created();

        #[cfg(feature = "tracing")]
        tracing::debug!(requester = %label, item = %_id, "Placed item");

        match ctx.queue.try_enqueue(item, ctx.admit_timeout).await {
            Ok(()) => {
                ctx.stats.record_admitted();
                let delivery = reply.await?;

                match delivery.outcome {
                    Ok(()) => {
                        #[cfg(feature = "tracing")]
                        tracing::info!(
                            requester = %label,
                            item = %_id,
                            processed_by = %delivery.processed_by,
                            "Consuming result"
                        );
                        ctx.simulator.pause(ctx.consume_base).await;
                        report.completed += 1;
                        ctx.stats.record_completed();
                    }
                    Err(_failure) => {
                        report.failed += 1;
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            requester = %label,
                            item = %_id,
                            reason = %_failure.reason,
                            "Item came back failed, ordering again"
                        );
                    }
                }
            }
            Err(EnqueueError::Timeout(abandoned)) => {
                drop(abandoned);
                report.abandoned += 1;
                ctx.stats.record_abandoned();
                #[cfg(feature = "tracing")]
                tracing::info!(requester = %label, item = %_id, "Waited too long, abandoning item");
                ctx.simulator.pause(ctx.abandon_base).await;
            }
            Err(EnqueueError::Closed(_)) => {
                #[cfg(feature = "tracing")]
                tracing::error!(requester = %label, item = %_id, "Admission queue closed under a running requester");
                return Err(Error::QueueClosed);
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::info!(
        requester = %label,
        completed = report.completed,
        abandoned = report.abandoned,
        "Requester going home"
    );

    Ok(report)
}
