#![forbid(unsafe_code)]

//! The weak callback value and its factories.
//!
//! # Design
//!
//! A [`WeakCallback`] pairs a weak handle with a bound operation. The
//! operation captures *which* method to run, never the target itself; the
//! target is supplied fresh on every call by upgrading the weak handle.
//!
//! ```text
//! call(args)
//!   └─ weak.upgrade()
//!        ├─ Some(strong) → method(&*strong, args); drop(strong)
//!        └─ None         → on_expired(); return
//! ```
//!
//! # Failure Modes
//!
//! | Condition | `call` | `try_call` |
//! |-----------|--------|------------|
//! | Target dropped | Returns, hook runs | `Err(Expired)`, hook runs |
//! | Method panics | Panic propagates, strong handle released | Same |
//! | Method returns `Err` | Discarded | `Ok(Err(..))` |
//! | Re-entrant mutating call on a `RefCell` target | Panics | Same |

use std::fmt;
use std::marker::PhantomData;

#[cfg(feature = "tracing")]
use tracing::trace;

use crate::method::{Exclusive, Method, MethodMut};
use crate::shared::{Downgrade, ExclusiveAccess, Upgrade};

/// Returned by [`WeakCallback::try_call`] when the target is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Expired;

impl fmt::Display for Expired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("callback target has been dropped")
    }
}

impl std::error::Error for Expired {}

/// Observer for calls that found their target gone.
pub trait OnExpired {
    /// Called once per missed invocation.
    fn on_expired(&self);
}

/// The default [`OnExpired`] policy: do nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Silent;

impl OnExpired for Silent {
    #[inline]
    fn on_expired(&self) {}
}

/// An [`OnExpired`] policy backed by a closure.
#[derive(Clone, Copy)]
pub struct ExpiryHook<F>(F);

impl<F: Fn()> OnExpired for ExpiryHook<F> {
    #[inline]
    fn on_expired(&self) {
        (self.0)()
    }
}

impl<F> fmt::Debug for ExpiryHook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiryHook").finish_non_exhaustive()
    }
}

/// A deferred method call on a weakly held target.
///
/// Cloning copies the weak handle (never a strong one) and the bound
/// method, so every clone keeps the same lifetime semantics.
///
/// # Type parameters
///
/// - `W`: the weak handle ([`std::rc::Weak`] or [`std::sync::Weak`]).
/// - `M`: the bound operation, a [`Method`] on the target.
/// - `Args`: the call arguments as a tuple.
/// - `H`: the [`OnExpired`] policy, [`Silent`] unless set.
///
/// # Invariants
///
/// 1. Holding a `WeakCallback` never keeps the target alive.
/// 2. The target is bound at construction and never changes.
/// 3. The strong handle taken for a call is released before `call` returns
///    or unwinds.
pub struct WeakCallback<W, M, Args, H = Silent> {
    target: W,
    method: M,
    on_expired: H,
    _args: PhantomData<fn(Args)>,
}

impl<W, M, Args> WeakCallback<W, M, Args, Silent>
where
    W: Upgrade,
    M: Method<W::Target, Args>,
{
    /// Bind `method` to the weakly held `target`.
    ///
    /// A target that is already gone is accepted; every call is then a no-op.
    #[must_use]
    pub fn new(target: W, method: M) -> Self {
        Self {
            target,
            method,
            on_expired: Silent,
            _args: PhantomData,
        }
    }
}

impl<W, M, Args, H> WeakCallback<W, M, Args, H>
where
    W: Upgrade,
    M: Method<W::Target, Args>,
    H: OnExpired,
{
    /// Replace the expiry policy with `hook`, run on every missed call.
    #[must_use]
    pub fn with_on_expired<G: Fn()>(self, hook: G) -> WeakCallback<W, M, Args, ExpiryHook<G>> {
        WeakCallback {
            target: self.target,
            method: self.method,
            on_expired: ExpiryHook(hook),
            _args: PhantomData,
        }
    }

    /// Run the bound method if the target is still alive.
    ///
    /// A dead target is skipped silently. Whatever the method returns is
    /// discarded; use [`try_call`](Self::try_call) to keep it.
    #[inline]
    pub fn call(&self, args: Args) {
        let _ = self.try_call(args);
    }

    /// Run the bound method if the target is still alive, returning its
    /// output, or [`Expired`] if the target is gone.
    pub fn try_call(&self, args: Args) -> Result<M::Output, Expired> {
        let Some(strong) = self.target.upgrade() else {
            #[cfg(feature = "tracing")]
            trace!(
                target_type = std::any::type_name::<W::Target>(),
                "weak callback skipped: target expired"
            );
            self.on_expired.on_expired();
            return Err(Expired);
        };
        Ok(self.method.invoke(&*strong, args))
    }

    /// `true` once the target has been dropped.
    ///
    /// A `false` answer can go stale immediately if the target is shared
    /// across threads.
    #[inline]
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.target.is_expired()
    }

    /// The weak handle this callback was built from.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &W {
        &self.target
    }

    /// Erase the callback into a plain closure, for schedulers that store
    /// `Box<dyn Fn(Args)>`.
    pub fn into_fn(self) -> impl Fn(Args) + Clone
    where
        W: Clone,
        M: Clone,
        H: Clone,
    {
        move |args| self.call(args)
    }
}

impl<W, M, Args, H> Clone for WeakCallback<W, M, Args, H>
where
    W: Clone,
    M: Clone,
    H: Clone,
{
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            method: self.method.clone(),
            on_expired: self.on_expired.clone(),
            _args: PhantomData,
        }
    }
}

impl<W: Upgrade, M, Args, H> fmt::Debug for WeakCallback<W, M, Args, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCallback")
            .field("target_type", &std::any::type_name::<W::Target>())
            .field("expired", &self.target.is_expired())
            .finish_non_exhaustive()
    }
}

/// Build a [`WeakCallback`] from a strong handle and a `&self` method.
///
/// The strong count of `target` is left untouched.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use weakcall::make_weak_callback;
///
/// struct Conn {
///     closes: AtomicUsize,
/// }
///
/// impl Conn {
///     fn force_close(&self) {
///         self.closes.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let conn = Arc::new(Conn { closes: AtomicUsize::new(0) });
/// let cb = make_weak_callback(&conn, Conn::force_close);
/// assert_eq!(Arc::strong_count(&conn), 1);
///
/// cb.call(());
/// assert_eq!(conn.closes.load(Ordering::SeqCst), 1);
/// ```
#[must_use]
pub fn make_weak_callback<S, M, Args>(target: &S, method: M) -> WeakCallback<S::Weak, M, Args>
where
    S: Downgrade,
    M: Method<S::Target, Args>,
{
    WeakCallback::new(Downgrade::downgrade(target), method)
}

/// Build a [`WeakCallback`] from a strong handle to an interior-mutable
/// target and a `&mut self` method.
///
/// The container (`RefCell`, `Mutex`, `RwLock`) is borrowed mutably for the
/// span of each call.
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use weakcall::make_weak_callback_mut;
///
/// #[derive(Default)]
/// struct Inbox {
///     messages: Vec<String>,
/// }
///
/// impl Inbox {
///     fn deliver(&mut self, msg: String) {
///         self.messages.push(msg);
///     }
/// }
///
/// let inbox = Rc::new(RefCell::new(Inbox::default()));
/// let cb = make_weak_callback_mut(&inbox, Inbox::deliver);
///
/// cb.call(("hello".to_string(),));
/// assert_eq!(inbox.borrow().messages, ["hello"]);
/// ```
#[must_use]
pub fn make_weak_callback_mut<S, M, Args>(
    target: &S,
    method: M,
) -> WeakCallback<S::Weak, Exclusive<M>, Args>
where
    S: Downgrade,
    S::Target: ExclusiveAccess,
    M: MethodMut<<S::Target as ExclusiveAccess>::Inner, Args>,
{
    WeakCallback::new(Downgrade::downgrade(target), Exclusive(method))
}
