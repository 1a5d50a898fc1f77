#![forbid(unsafe_code)]

//! Arity-generic method traits.
//!
//! Rust has no variadic generics, so call arguments travel as a tuple:
//! `()`, `(A1,)`, `(A1, A2)` and so on up to eight elements. Every plain
//! function or closure whose first parameter is the target implements the
//! matching trait, which means method paths work directly:
//!
//! ```
//! use weakcall::Method;
//!
//! struct Greeter;
//!
//! impl Greeter {
//!     fn greet(&self, name: &str, times: usize) -> String {
//!         format!("hi {name}").repeat(times)
//!     }
//! }
//!
//! let out = Greeter::greet.invoke(&Greeter, ("bo", 2));
//! assert_eq!(out, "hi bohi bo");
//! ```
//!
//! Arguments are moved into the call, never cloned, so move-only values
//! pass through unchanged.

use crate::shared::ExclusiveAccess;

/// An operation run on a shared reference to its target.
///
/// Blanket-implemented for every `Fn(&T, A1, .., An) -> R` with n <= 8.
pub trait Method<T: ?Sized, Args> {
    /// Value produced by the operation.
    type Output;

    /// Run the operation on `target`.
    fn invoke(&self, target: &T, args: Args) -> Self::Output;
}

/// An operation that needs exclusive access to its target.
///
/// Blanket-implemented for every `Fn(&mut T, A1, .., An) -> R` with n <= 8.
pub trait MethodMut<T: ?Sized, Args> {
    /// Value produced by the operation.
    type Output;

    /// Run the operation on `target`.
    fn invoke_mut(&self, target: &mut T, args: Args) -> Self::Output;
}

macro_rules! impl_method_arity {
    ($($arg:ident),*) => {
        impl<T, F, R, $($arg,)*> Method<T, ($($arg,)*)> for F
        where
            T: ?Sized,
            F: Fn(&T, $($arg),*) -> R,
        {
            type Output = R;

            #[inline]
            #[allow(non_snake_case)]
            fn invoke(&self, target: &T, ($($arg,)*): ($($arg,)*)) -> R {
                (self)(target, $($arg),*)
            }
        }

        impl<T, F, R, $($arg,)*> MethodMut<T, ($($arg,)*)> for F
        where
            T: ?Sized,
            F: Fn(&mut T, $($arg),*) -> R,
        {
            type Output = R;

            #[inline]
            #[allow(non_snake_case)]
            fn invoke_mut(&self, target: &mut T, ($($arg,)*): ($($arg,)*)) -> R {
                (self)(target, $($arg),*)
            }
        }
    };
}

impl_method_arity!();
impl_method_arity!(A1);
impl_method_arity!(A1, A2);
impl_method_arity!(A1, A2, A3);
impl_method_arity!(A1, A2, A3, A4);
impl_method_arity!(A1, A2, A3, A4, A5);
impl_method_arity!(A1, A2, A3, A4, A5, A6);
impl_method_arity!(A1, A2, A3, A4, A5, A6, A7);
impl_method_arity!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Adapter running a [`MethodMut`] through an [`ExclusiveAccess`] container.
///
/// `Exclusive<M>` is a [`Method`] on the container (`RefCell<T>`,
/// `Mutex<T>`, `RwLock<T>`), borrowing the inner value mutably for exactly
/// the duration of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclusive<M>(pub M);

impl<C, M, Args> Method<C, Args> for Exclusive<M>
where
    C: ExclusiveAccess + ?Sized,
    M: MethodMut<C::Inner, Args>,
{
    type Output = M::Output;

    #[inline]
    fn invoke(&self, target: &C, args: Args) -> M::Output {
        target.with_exclusive(|inner| self.0.invoke_mut(inner, args))
    }
}
