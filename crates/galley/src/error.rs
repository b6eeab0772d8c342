//! Error types for the admission pipeline.
//!
//! Admission timeouts are not errors: they are reported through
//! [`EnqueueError`](crate::EnqueueError) and handled by the requester as a
//! routine outcome. [`Error`] covers the cases that indicate misuse or a broken
//! invariant.
//!
//! ## Error Cases
//! - `ReplyDropped`: A work item's reply slot was dropped without a reply.
//! - `QueueClosed`: A requester tried to admit work after the queue closed.
//! - `InvalidConfig`: The pipeline configuration cannot be run.
//! - `TaskFailed`: A spawned requester or worker task panicked or was aborted.

use crate::ItemId;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Unified error type for the pipeline.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The responder for an admitted item was dropped before replying. This
    /// only happens when a worker loses an item, which is a logic bug.
    #[error("Reply for item {id} was dropped without being sent")]
    ReplyDropped { id: ItemId },

    /// The admission queue was closed while a requester was still running.
    #[error("Admission queue is closed")]
    QueueClosed,

    /// The configuration was rejected before startup.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// A spawned task did not run to completion.
    #[error("Task {task} failed: {context}")]
    TaskFailed { task: String, context: String },
}
