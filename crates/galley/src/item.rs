use crate::{
    IdCounter, ItemId,
    reply::{self, PendingReply, Responder},
};
use std::sync::Arc;

/// Why a work function could not produce a result for an item.
///
/// Delivered to the requester through the item's reply slot instead of
/// crashing the worker that hit it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("work failed: {reason}")]
pub struct WorkFailure {
    pub reason: String,
}

impl WorkFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The result a requester reads from its reply slot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Delivery {
    pub id: ItemId,
    pub requester: Arc<str>,
    pub processed_by: Arc<str>,
    pub outcome: Result<(), WorkFailure>,
}

impl Delivery {
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// A unit of work travelling from a requester, through the admission queue, to
/// a worker.
///
/// The item owns the write half of its reply slot. Completing it consumes the
/// item, so a reply can be written at most once.
#[derive(Debug)]
pub struct WorkItem {
    id: ItemId,
    requester: Arc<str>,
    processed_by: Option<Arc<str>>,
    reply: Responder<Delivery>,
}

impl WorkItem {
    pub const fn id(&self) -> ItemId {
        self.id
    }

    pub fn requester(&self) -> &str {
        &self.requester
    }

    /// Name of the worker that processed this item, if any has yet.
    pub fn processed_by(&self) -> Option<&str> {
        self.processed_by.as_deref()
    }

    /// Records `worker` as the processor and writes `outcome` into the reply
    /// slot.
    ///
    /// # Errors
    ///
    /// Returns the [`Delivery`] if the requester is no longer waiting for it.
    pub fn complete(
        mut self,
        worker: Arc<str>,
        outcome: Result<(), WorkFailure>,
    ) -> Result<(), Delivery> {
        self.processed_by = Some(Arc::clone(&worker));
        let delivery = Delivery {
            id: self.id,
            requester: self.requester,
            processed_by: worker,
            outcome,
        };
        self.reply.send(delivery)
    }
}

/// Builds [`WorkItem`]s with fresh ids and reply slots.
#[derive(Debug, Default)]
pub struct ItemFactory {
    ids: IdCounter,
}

impl ItemFactory {
    pub const fn new(ids: IdCounter) -> Self {
        Self { ids }
    }

    /// Creates a new item for `requester` and returns it together with the
    /// read half of its reply slot.
    pub fn create(&self, requester: &Arc<str>) -> (WorkItem, PendingReply<Delivery>) {
        let id = self.ids.next_id();
        let (responder, pending) = reply::slot(id);
        let item = WorkItem {
            id,
            requester: Arc::clone(requester),
            processed_by: None,
            reply: responder,
        };
        (item, pending)
    }

    /// The id the next created item will carry.
    pub fn next_id(&self) -> ItemId {
        self.ids.peek()
    }
}
