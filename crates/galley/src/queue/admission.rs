//! Bounded, closable FIFO admission queue.
//!
//! This module defines [`AdmissionQueue`], the single shared resource between
//! requesters and workers. It keeps two concerns apart:
//!
//! - **Buffering**: a `VecDeque` guarded by a mutex, with a [`Semaphore`]
//!   holding one permit per free slot. Producers reserve a slot before pushing
//!   and consumers release one after popping, so occupancy never exceeds the
//!   capacity.
//! - **Termination**: a [`CancellationToken`] that marks the queue closed.
//!   Consumers only consult it once the buffer is empty, which lets them drain
//!   everything admitted before the close.
//!
//! Slot reservation and the push happen without a suspension point in
//! between. An enqueue attempt that times out or observes the close has not
//! touched the buffer.

use crate::{EnqueueError, Error, Result};
use core::{fmt, pin::pin, time::Duration};
use parking_lot::Mutex;
use portable_atomic::{AtomicUsize, Ordering};
use std::collections::VecDeque;
use tokio::sync::{Notify, Semaphore, SemaphorePermit, TryAcquireError};
use tokio_util::sync::CancellationToken;

/// Outcome of a non-suspending [`AdmissionQueue::try_dequeue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DequeueStatus<T> {
    /// The oldest queued item.
    Ready { item: T },
    /// Nothing is queued, but the queue is still open.
    Empty,
    /// The queue is closed and every admitted item has been taken.
    Drained,
}

/// A fixed-capacity, multi-producer/multi-consumer FIFO with timed admission
/// and close-then-drain shutdown.
///
/// All methods take `&self`; share the queue through an `Arc`.
pub struct AdmissionQueue<T> {
    items: Mutex<VecDeque<T>>,
    slots: Semaphore,
    ready: Notify,
    closed: CancellationToken,
    capacity: usize,
    high_water: AtomicUsize,
}

impl<T> AdmissionQueue<T> {
    /// Creates an open, empty queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `capacity` is zero or exceeds
    /// [`Semaphore::MAX_PERMITS`].
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig {
                reason: "queue capacity must be greater than 0".to_string(),
            });
        }
        if capacity > Semaphore::MAX_PERMITS {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "queue capacity {capacity} exceeds the maximum of {}",
                    Semaphore::MAX_PERMITS
                ),
            });
        }

        Ok(Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            slots: Semaphore::new(capacity),
            ready: Notify::new(),
            closed: CancellationToken::new(),
            capacity,
            high_water: AtomicUsize::new(0),
        })
    }

    /// Tries to admit `item`, waiting at most `timeout` for a free slot.
    ///
    /// Exactly one of three things happens:
    ///
    /// - a slot is free now, or frees up before the deadline: the item is
    ///   queued and `Ok(())` is returned;
    /// - the deadline passes first: [`EnqueueError::Timeout`];
    /// - the queue is (or becomes, while waiting) closed:
    ///   [`EnqueueError::Closed`], without waiting for the deadline.
    ///
    /// A zero `timeout` never suspends.
    ///
    /// # Errors
    ///
    /// See above; the rejected item is returned inside the error.
    pub async fn try_enqueue(&self, item: T, timeout: Duration) -> Result<(), EnqueueError<T>> {
        let permit = match self.slots.try_acquire() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return Err(EnqueueError::Closed(item)),
            Err(TryAcquireError::NoPermits) if timeout.is_zero() => {
                return Err(EnqueueError::Timeout(item));
            }
            Err(TryAcquireError::NoPermits) => {
                match tokio::time::timeout(timeout, self.slots.acquire()).await {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_)) => return Err(EnqueueError::Closed(item)),
                    Err(_) => return Err(EnqueueError::Timeout(item)),
                }
            }
        };

        self.push(permit, item)
    }

    /// Admits `item`, waiting as long as it takes for a free slot.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Closed`] if the queue is or becomes closed
    /// before a slot frees up.
    pub async fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        match self.slots.acquire().await {
            Ok(permit) => self.push(permit, item),
            Err(_) => Err(EnqueueError::Closed(item)),
        }
    }

    fn push(&self, permit: SemaphorePermit<'_>, item: T) -> Result<(), EnqueueError<T>> {
        let mut items = self.items.lock();
        // `close` flips the token under the same lock.
        if self.closed.is_cancelled() {
            return Err(EnqueueError::Closed(item));
        }
        items.push_back(item);
        let depth = items.len();
        drop(items);

        // The slot stays taken until `try_dequeue` releases it.
        permit.forget();
        self.high_water.fetch_max(depth, Ordering::Relaxed);
        self.ready.notify_one();
        Ok(())
    }

    /// Takes the oldest item, waiting while the queue is empty and open.
    ///
    /// Returns `None` once the queue is closed and fully drained; from then on
    /// every call returns `None` immediately.
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            // Register interest before checking so a push between the check
            // and the await still wakes us.
            let mut notified = pin!(self.ready.notified());
            notified.as_mut().enable();

            match self.try_dequeue() {
                DequeueStatus::Ready { item } => return Some(item),
                DequeueStatus::Drained => return None,
                DequeueStatus::Empty => {}
            }

            tokio::select! {
                () = &mut notified => {}
                () = self.closed.cancelled() => {}
            }
        }
    }

    /// Takes the oldest item without waiting.
    pub fn try_dequeue(&self) -> DequeueStatus<T> {
        let mut items = self.items.lock();
        let front = items.pop_front();
        match front {
            Some(item) => {
                drop(items);
                self.slots.add_permits(1);
                DequeueStatus::Ready { item }
            }
            None if self.closed.is_cancelled() => DequeueStatus::Drained,
            None => DequeueStatus::Empty,
        }
    }

    /// Closes the queue.
    ///
    /// Pending and future enqueue attempts fail with [`EnqueueError::Closed`].
    /// Items already queued stay available to [`dequeue`](Self::dequeue).
    /// Closing twice is harmless; the return value tells whether this call
    /// was the one that closed it.
    pub fn close(&self) -> bool {
        let items = self.items.lock();
        if self.closed.is_cancelled() {
            return false;
        }
        self.closed.cancel();
        let _remaining = items.len();
        drop(items);
        self.slots.close();

        #[cfg(feature = "tracing")]
        tracing::debug!(remaining = _remaining, "Admission queue closed");

        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots an enqueue could reserve right now. Zero once closed.
    pub fn available_slots(&self) -> usize {
        if self.is_closed() {
            0
        } else {
            self.slots.available_permits()
        }
    }

    /// Highest number of items that were ever queued at the same time.
    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }
}

impl<T> fmt::Debug for AdmissionQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .field("high_water_mark", &self.high_water_mark())
            .finish()
    }
}
