use core::fmt;
use portable_atomic::{AtomicU64, Ordering};

/// Identifier of a single [`WorkItem`](crate::WorkItem).
///
/// Issued by an [`IdCounter`]; two items created from the same counter never
/// share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ItemId(u64);

impl ItemId {
    /// Wraps a raw id value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A lock-free, monotonically increasing id source.
///
/// The counter is an owned value rather than process-wide state: whoever needs
/// unique ids holds (or shares through an `Arc`) a counter and every id it
/// hands out is distinct. Ids start at 1.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ No duplicate or lost values under concurrent `next_id` calls
///
/// With the `cache-padded` feature the atomic is padded to a cache line to
/// avoid false sharing with neighbouring fields.
#[derive(Debug)]
pub struct IdCounter {
    #[cfg(feature = "cache-padded")]
    next: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    next: AtomicU64,
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl IdCounter {
    /// Creates a counter whose first id is `#1`.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a counter whose first id is `first`.
    ///
    /// Mostly useful in tests or when resuming a numbering scheme.
    pub fn starting_at(first: u64) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            next: crossbeam_utils::CachePadded::new(AtomicU64::new(first)),
            #[cfg(not(feature = "cache-padded"))]
            next: AtomicU64::new(first),
        }
    }

    /// Atomically takes the next id.
    ///
    /// No other memory is published through the counter, so `Relaxed` is
    /// sufficient.
    pub fn next_id(&self) -> ItemId {
        ItemId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the id the next call to [`next_id`](Self::next_id) will hand
    /// out.
    pub fn peek(&self) -> ItemId {
        ItemId(self.next.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::thread::scope;

    #[test]
    fn ids_start_at_one_and_increase() {
        let counter = IdCounter::new();
        assert_eq!(counter.next_id(), ItemId::from_raw(1));
        assert_eq!(counter.next_id(), ItemId::from_raw(2));
        assert_eq!(counter.peek(), ItemId::from_raw(3));
    }

    #[test]
    fn display_uses_hash_prefix() {
        assert_eq!(ItemId::from_raw(42).to_string(), "#42");
    }

    #[test]
    fn ids_are_unique_across_threads() {
        const THREADS: usize = 8;
        const TOTAL_IDS: usize = 8192;
        const IDS_PER_THREAD: usize = TOTAL_IDS / THREADS;

        let counter = Arc::new(IdCounter::new());
        let seen_ids = Arc::new(Mutex::new(HashSet::with_capacity(TOTAL_IDS)));

        scope(|s| {
            for _ in 0..THREADS {
                let counter = Arc::clone(&counter);
                let seen_ids = Arc::clone(&seen_ids);

                s.spawn(move || {
                    let local: Vec<_> = (0..IDS_PER_THREAD).map(|_| counter.next_id()).collect();
                    let mut seen = seen_ids.lock().unwrap();
                    for id in local {
                        assert!(seen.insert(id), "duplicate id {id}");
                    }
                });
            }
        });

        let seen = seen_ids.lock().unwrap();
        assert_eq!(seen.len(), TOTAL_IDS);
        // No values were skipped either.
        let max = seen.iter().map(|id| id.to_raw()).max().unwrap();
        assert_eq!(max, TOTAL_IDS as u64);
        assert_eq!(counter.peek(), ItemId::from_raw(TOTAL_IDS as u64 + 1));
    }
}
