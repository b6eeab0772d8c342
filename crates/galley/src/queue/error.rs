use core::fmt;

/// Why [`AdmissionQueue::try_enqueue`] did not admit an item.
///
/// The rejected item is handed back so the caller decides what happens to it.
/// Either way it never entered the queue.
///
/// [`AdmissionQueue::try_enqueue`]: crate::AdmissionQueue::try_enqueue
#[derive(Clone, PartialEq, Eq)]
pub enum EnqueueError<T> {
    /// No slot freed up before the deadline.
    Timeout(T),
    /// The queue is closed and admits nothing anymore.
    Closed(T),
}

impl<T> EnqueueError<T> {
    /// Returns the rejected item.
    pub fn into_inner(self) -> T {
        match self {
            Self::Timeout(item) | Self::Closed(item) => item,
        }
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

// `T` need not be `Debug`.
impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(_) => f.write_str("Timeout(..)"),
            Self::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(_) => f.write_str("timed out waiting for an admission slot"),
            Self::Closed(_) => f.write_str("admission queue is closed"),
        }
    }
}

impl<T> core::error::Error for EnqueueError<T> {}
