#![forbid(unsafe_code)]

//! Test harness for `weakcall`.
//!
//! # Role
//! `weakcall` deliberately stops at the callback value; whoever stores and
//! fires callbacks lives outside it. This crate provides that outside world
//! for tests:
//!
//! - [`DeferredQueue`]: a deterministic, manually clocked timer queue, the
//!   shape of an event loop's `run_after`.
//! - [`Connection`]: a target that schedules its own delayed close through a
//!   weak callback, so the pending timer never keeps it alive.
//! - [`DropLedger`]: counts target drops, for asserting that pending
//!   callbacks do not delay destruction.

pub mod deferred_queue;
pub mod fixtures;

pub use deferred_queue::{DeferredQueue, TimerId};
pub use fixtures::{ConnState, Connection, DropLedger, DropToken};
