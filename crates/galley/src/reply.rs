//! Single-use reply slots.
//!
//! A reply slot correlates a response with the request that produced it
//! without any message ids on the wire: the requester keeps the read half
//! ([`PendingReply`]) and the write half ([`Responder`]) travels with the work
//! item. The write half is consumed by [`Responder::send`], so a slot can only
//! be written once; the read half is a future, so it can only be read once.

use crate::{Error, ItemId};
use core::{
    pin::Pin,
    task::{Context, Poll},
};
use pin_project_lite::pin_project;
use tokio::sync::oneshot;

/// Creates a reply slot for the item identified by `id`.
pub fn slot<T>(id: ItemId) -> (Responder<T>, PendingReply<T>) {
    let (tx, rx) = oneshot::channel();
    (Responder { id, tx }, PendingReply { id, rx })
}

/// Write half of a reply slot.
#[derive(Debug)]
pub struct Responder<T> {
    id: ItemId,
    tx: oneshot::Sender<T>,
}

impl<T> Responder<T> {
    /// Id of the item this responder answers for.
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Writes the reply.
    ///
    /// # Errors
    ///
    /// Returns the value back if the [`PendingReply`] was dropped.
    pub fn send(self, value: T) -> Result<(), T> {
        self.tx.send(value)
    }

    /// Returns `true` if nobody is waiting for the reply anymore.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

pin_project! {
    /// Read half of a reply slot.
    ///
    /// Resolves once the matching [`Responder`] sends. If the responder is
    /// dropped without sending, resolves to [`Error::ReplyDropped`].
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    #[derive(Debug)]
    pub struct PendingReply<T> {
        id: ItemId,
        #[pin]
        rx: oneshot::Receiver<T>,
    }
}

impl<T> PendingReply<T> {
    /// Id of the item this reply belongs to.
    pub const fn id(&self) -> ItemId {
        self.id
    }
}

impl<T> Future for PendingReply<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.rx.poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(Ok(value)),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ReplyDropped { id: *this.id })),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_the_written_value() {
        let (responder, pending) = slot::<&'static str>(ItemId::from_raw(7));
        assert_eq!(responder.id(), pending.id());
        assert!(!responder.is_abandoned());

        responder.send("ready").unwrap();
        assert_eq!(pending.await, Ok("ready"));
    }

    #[tokio::test]
    async fn dropped_responder_surfaces_as_error() {
        let (responder, pending) = slot::<u32>(ItemId::from_raw(3));
        drop(responder);

        assert_eq!(
            pending.await,
            Err(Error::ReplyDropped {
                id: ItemId::from_raw(3)
            })
        );
    }

    #[test]
    fn send_after_reader_gone_returns_value() {
        let (responder, pending) = slot::<u32>(ItemId::from_raw(1));
        drop(pending);

        assert!(responder.is_abandoned());
        assert_eq!(responder.send(11), Err(11));
    }
}
