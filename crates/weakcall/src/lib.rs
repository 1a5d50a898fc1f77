#![forbid(unsafe_code)]

//! Weak callbacks: deferred method calls that never keep their target alive.
//!
//! # Role
//! A timer, an event source or a connection often wants to call back into an
//! object it does not own. Holding a strong handle would extend that object's
//! life (and usually close a reference cycle); holding a plain reference would
//! dangle. [`WeakCallback`] holds a weak handle instead, upgrades it for the
//! span of one call, and does nothing at all once the target is gone.
//!
//! # Primary pieces
//! - [`WeakCallback`]: the callback value. Cheap to clone, never strong.
//! - [`make_weak_callback`] / [`make_weak_callback_mut`]: build one from a
//!   strong handle and a method path such as `Session::close`.
//! - [`shared`]: the weak/strong seam (`Rc`/`Arc`, `RefCell`/`Mutex`/`RwLock`).
//! - [`method`]: arity-generic method traits; arguments travel as tuples.
//!
//! # Invariants
//!
//! 1. A live target receives exactly one method call per `call`.
//! 2. A dead target receives nothing and the caller sees a normal return.
//! 3. Constructing, cloning or holding a callback never raises the target's
//!    strong count.
//! 4. The temporary strong handle lives exactly as long as the method call,
//!    including when the method panics.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use weakcall::make_weak_callback;
//!
//! struct Counter {
//!     hits: Cell<u32>,
//! }
//!
//! impl Counter {
//!     fn bump(&self, by: u32) {
//!         self.hits.set(self.hits.get() + by);
//!     }
//! }
//!
//! let counter = Rc::new(Counter { hits: Cell::new(0) });
//! let cb = make_weak_callback(&counter, Counter::bump);
//!
//! cb.call((2,));
//! assert_eq!(counter.hits.get(), 2);
//!
//! drop(counter);
//! cb.call((2,)); // target gone: silently skipped
//! assert!(cb.is_expired());
//! ```

pub mod callback;
pub mod logging;
pub mod method;
pub mod shared;

pub use callback::{
    Expired, ExpiryHook, OnExpired, Silent, WeakCallback, make_weak_callback,
    make_weak_callback_mut,
};
pub use method::{Exclusive, Method, MethodMut};
pub use shared::{Downgrade, ExclusiveAccess, Upgrade};
