#![forbid(unsafe_code)]

//! Instrumented targets.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;
use weakcall::make_weak_callback;

use crate::deferred_queue::{DeferredQueue, TimerId};

/// Counts how many [`DropToken`]s handed out by this ledger have dropped.
///
/// Clones share the same count. Thread-safe, so it works for `Arc` targets.
#[derive(Debug, Clone, Default)]
pub struct DropLedger {
    dropped: Arc<AtomicUsize>,
}

impl DropLedger {
    /// An empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token to embed in a target; its drop is recorded here.
    #[must_use]
    pub fn token(&self) -> DropToken {
        DropToken {
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Number of tokens dropped so far.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

/// Records its own drop in the [`DropLedger`] that issued it.
#[derive(Debug)]
pub struct DropToken {
    dropped: Arc<AtomicUsize>,
}

impl Drop for DropToken {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Connected,
    Disconnected,
}

/// A connection-like target.
///
/// Its delayed close goes through a weak callback: a pending close timer
/// never keeps a connection alive, and a connection dropped before the timer
/// fires is simply skipped.
#[derive(Debug)]
pub struct Connection {
    name: String,
    state: Cell<ConnState>,
    closes: Cell<u32>,
    outbox: RefCell<Vec<String>>,
    _token: DropToken,
}

impl Connection {
    /// A connected connection whose drop is recorded in `ledger`.
    #[must_use]
    pub fn new(name: impl Into<String>, ledger: &DropLedger) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            state: Cell::new(ConnState::Connected),
            closes: Cell::new(0),
            outbox: RefCell::new(Vec::new()),
            _token: ledger.token(),
        })
    }

    /// Name given at construction.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnState {
        self.state.get()
    }

    /// Times `force_close` ran, including on an already closed connection.
    #[must_use]
    pub fn close_count(&self) -> u32 {
        self.closes.get()
    }

    /// Messages accepted by [`send`](Self::send), oldest first.
    #[must_use]
    pub fn outbox(&self) -> Vec<String> {
        self.outbox.borrow().clone()
    }

    /// Queue `msg` if connected. Returns whether it was accepted.
    pub fn send(&self, msg: &str) -> bool {
        if self.state.get() == ConnState::Disconnected {
            return false;
        }
        self.outbox.borrow_mut().push(msg.to_string());
        true
    }

    /// Disconnect immediately.
    pub fn force_close(&self) {
        self.closes.set(self.closes.get() + 1);
        if self.state.replace(ConnState::Disconnected) == ConnState::Connected {
            debug!(conn = %self.name, "connection force-closed");
        }
    }

    /// Schedule [`force_close`](Self::force_close) after `ticks`, holding
    /// this connection only weakly.
    pub fn force_close_with_delay(
        self: &Rc<Self>,
        queue: &mut DeferredQueue,
        ticks: u64,
    ) -> TimerId {
        let cb = make_weak_callback(self, Connection::force_close);
        queue.schedule_after(ticks, move || cb.call(()))
    }

    /// Schedule a delayed [`send`](Self::send), holding this connection only
    /// weakly.
    pub fn send_with_delay(
        self: &Rc<Self>,
        queue: &mut DeferredQueue,
        ticks: u64,
        msg: String,
    ) -> TimerId {
        let cb = make_weak_callback(self, |conn: &Connection, msg: String| {
            conn.send(&msg);
        });
        queue.schedule_after(ticks, move || cb.call((msg,)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_counts_drops() {
        let ledger = DropLedger::new();
        let a = ledger.token();
        let b = ledger.token();
        assert_eq!(ledger.dropped(), 0);
        drop(a);
        assert_eq!(ledger.dropped(), 1);
        drop(b);
        assert_eq!(ledger.clone().dropped(), 2);
    }

    #[test]
    fn force_close_is_idempotent_on_state() {
        let ledger = DropLedger::new();
        let conn = Connection::new("c1", &ledger);
        assert_eq!(conn.state(), ConnState::Connected);
        conn.force_close();
        conn.force_close();
        assert_eq!(conn.state(), ConnState::Disconnected);
        assert_eq!(conn.close_count(), 2);
    }

    #[test]
    fn send_rejected_after_close() {
        let ledger = DropLedger::new();
        let conn = Connection::new("c1", &ledger);
        assert!(conn.send("one"));
        conn.force_close();
        assert!(!conn.send("two"));
        assert_eq!(conn.outbox(), vec!["one"]);
        assert_eq!(conn.name(), "c1");
    }
}
