#![forbid(unsafe_code)]

//! Deterministic deferred-call queue.
//!
//! Time is a tick counter moved only by [`DeferredQueue::advance`], so tests
//! never sleep and never race.
//!
//! # Invariants
//!
//! 1. Entries fire in deadline order; equal deadlines fire in scheduling
//!    order.
//! 2. Each entry fires at most once.
//! 3. A cancelled entry never fires.
//! 4. `now()` only moves forward.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

/// Handle for a scheduled entry, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    deadline: u64,
    seq: u64,
}

impl TimerId {
    /// Tick at which the entry fires.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> u64 {
        self.deadline
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timer({}@{})", self.seq, self.deadline)
    }
}

type Task = Box<dyn FnOnce()>;

/// A single-threaded timer queue with a manual clock.
#[derive(Default)]
pub struct DeferredQueue {
    now: u64,
    next_seq: u64,
    entries: BTreeMap<TimerId, Task>,
}

impl DeferredQueue {
    /// Create an empty queue at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tick.
    #[inline]
    #[must_use]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Number of entries not yet fired or cancelled.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Schedule `task` to fire `ticks` after the current tick.
    ///
    /// A delay of zero fires on the next [`advance`](Self::advance), even
    /// `advance(0)`.
    pub fn schedule_after(&mut self, ticks: u64, task: impl FnOnce() + 'static) -> TimerId {
        let id = TimerId {
            deadline: self.now.saturating_add(ticks),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(id, Box::new(task));
        debug!(timer = %id, now = self.now, "deferred call scheduled");
        id
    }

    /// Cancel a pending entry. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            debug!(timer = %id, "deferred call cancelled");
        }
        removed
    }

    /// Move the clock forward by `ticks` and fire every entry now due.
    ///
    /// Returns the number of entries fired.
    pub fn advance(&mut self, ticks: u64) -> usize {
        self.now = self.now.saturating_add(ticks);
        let mut fired = 0;
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().deadline > self.now {
                break;
            }
            let (id, task) = entry.remove_entry();
            trace!(timer = %id, now = self.now, "deferred call fired");
            task();
            fired += 1;
        }
        fired
    }
}

impl fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("now", &self.now)
            .field("pending", &self.entries.len())
            .finish()
    }
}
