#![forbid(unsafe_code)]

//! Strong/weak handle seam.
//!
//! [`WeakCallback`](crate::WeakCallback) is written against these traits
//! rather than a concrete pointer type, so the same callback works over
//! single-threaded `Rc` targets and shared `Arc` targets.
//!
//! # Thread safety
//!
//! Nothing here adds synchronization. `std::sync::Weak::upgrade` checks
//! liveness and bumps the strong count atomically, so a concurrent drop can
//! never hand out a half-destroyed target. `Rc` handles are `!Send` and
//! never race in the first place.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::{self, Rc};
use std::sync::{self, Arc, Mutex, PoisonError, RwLock};

/// A non-owning handle that can try to produce an owning one.
pub trait Upgrade {
    /// The pointee.
    type Target: ?Sized;
    /// The owning handle produced by a successful upgrade.
    type Strong: Deref<Target = Self::Target>;

    /// Attempt to obtain a strong handle. `None` once the target is dropped.
    fn upgrade(&self) -> Option<Self::Strong>;

    /// `true` once no strong handle to the target remains.
    fn is_expired(&self) -> bool;
}

/// An owning handle that can hand out non-owning ones.
pub trait Downgrade: Deref + Sized {
    /// The weak form of `Self`.
    type Weak: Upgrade<Target = Self::Target, Strong = Self>;

    /// Derive a weak handle without touching the strong count.
    fn downgrade(this: &Self) -> Self::Weak;
}

impl<T: ?Sized> Upgrade for rc::Weak<T> {
    type Target = T;
    type Strong = Rc<T>;

    #[inline]
    fn upgrade(&self) -> Option<Rc<T>> {
        rc::Weak::upgrade(self)
    }

    #[inline]
    fn is_expired(&self) -> bool {
        self.strong_count() == 0
    }
}

impl<T: ?Sized> Upgrade for sync::Weak<T> {
    type Target = T;
    type Strong = Arc<T>;

    #[inline]
    fn upgrade(&self) -> Option<Arc<T>> {
        sync::Weak::upgrade(self)
    }

    #[inline]
    fn is_expired(&self) -> bool {
        self.strong_count() == 0
    }
}

impl<T: ?Sized> Downgrade for Rc<T> {
    type Weak = rc::Weak<T>;

    #[inline]
    fn downgrade(this: &Self) -> rc::Weak<T> {
        Rc::downgrade(this)
    }
}

impl<T: ?Sized> Downgrade for Arc<T> {
    type Weak = sync::Weak<T>;

    #[inline]
    fn downgrade(this: &Self) -> sync::Weak<T> {
        Arc::downgrade(this)
    }
}

/// Interior-mutability containers that lend `&mut Inner` for one closure.
///
/// This is what lets a mutating method run on a target reached through a
/// shared handle.
///
/// # Failure Modes
///
/// | Container | Condition | Behavior |
/// |-----------|-----------|----------|
/// | `RefCell` | Already borrowed (re-entrant call) | Panics |
/// | `Mutex`   | Poisoned by an earlier panic | Entered anyway |
/// | `Mutex`   | Re-entrant call on the same thread | Deadlock |
/// | `RwLock`  | Poisoned by an earlier panic | Entered anyway |
///
/// A poisoned lock is not treated as an error: the panic that poisoned it
/// already reached its own caller.
pub trait ExclusiveAccess {
    /// The value handed out mutably.
    type Inner: ?Sized;

    /// Run `f` with exclusive access to the inner value.
    fn with_exclusive<R>(&self, f: impl FnOnce(&mut Self::Inner) -> R) -> R;
}

impl<T: ?Sized> ExclusiveAccess for RefCell<T> {
    type Inner = T;

    fn with_exclusive<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut *self.borrow_mut())
    }
}

impl<T: ?Sized> ExclusiveAccess for Mutex<T> {
    type Inner = T;

    fn with_exclusive<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }
}

impl<T: ?Sized> ExclusiveAccess for RwLock<T> {
    type Inner = T;

    fn with_exclusive<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    #[test]
    fn rc_downgrade_does_not_bump_strong_count() {
        let rc = Rc::new(5);
        let weak = Downgrade::downgrade(&rc);
        assert_eq!(Rc::strong_count(&rc), 1);
        assert!(!weak.is_expired());
        assert_eq!(weak.upgrade().as_deref(), Some(&5));
    }

    #[test]
    fn rc_weak_expires_with_last_strong() {
        let rc = Rc::new(String::from("gone"));
        let weak = Downgrade::downgrade(&rc);
        drop(rc);
        assert!(weak.is_expired());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn dangling_weak_is_expired() {
        let weak: rc::Weak<u8> = rc::Weak::new();
        assert!(weak.is_expired());
        assert!(Upgrade::upgrade(&weak).is_none());

        let weak: sync::Weak<u8> = sync::Weak::new();
        assert!(weak.is_expired());
        assert!(Upgrade::upgrade(&weak).is_none());
    }

    #[test]
    fn arc_roundtrip_and_expiry() {
        let arc = Arc::new(vec![1, 2, 3]);
        let weak = Downgrade::downgrade(&arc);
        assert_eq!(Arc::strong_count(&arc), 1);
        {
            let strong = Upgrade::upgrade(&weak).unwrap();
            assert_eq!(strong.len(), 3);
            assert_eq!(Arc::strong_count(&arc), 2);
        }
        assert_eq!(Arc::strong_count(&arc), 1);
        drop(arc);
        assert!(weak.is_expired());
    }

    #[test]
    fn unsized_targets_are_supported() {
        let rc: Rc<str> = Rc::from("abc");
        let weak = Downgrade::downgrade(&rc);
        assert_eq!(weak.upgrade().as_deref(), Some("abc"));
    }

    #[test]
    fn refcell_exclusive_access() {
        let cell = RefCell::new(1);
        let out = cell.with_exclusive(|v| {
            *v += 1;
            *v * 10
        });
        assert_eq!(out, 20);
        assert_eq!(*cell.borrow(), 2);
    }

    #[test]
    fn mutex_exclusive_access_survives_poison() {
        let lock = Arc::new(Mutex::new(0));
        let poisoner = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(lock.is_poisoned());

        lock.with_exclusive(|v| *v = 7);
        assert_eq!(*lock.lock().unwrap_or_else(PoisonError::into_inner), 7);
    }

    #[test]
    fn rwlock_exclusive_access() {
        let lock = RwLock::new(String::new());
        lock.with_exclusive(|s| s.push_str("written"));
        assert_eq!(lock.read().unwrap().as_str(), "written");
    }

    #[test]
    fn refcell_reentrant_access_panics() {
        let cell = RefCell::new(0);
        let result = catch_unwind(AssertUnwindSafe(|| {
            cell.with_exclusive(|_| cell.with_exclusive(|v| *v += 1));
        }));
        assert!(result.is_err());
    }
}
