//! The contract shared by every resilience behavior.
//!
//! A behavior sits between the caller and the rest of a delivery pipeline.
//! It answers two questions:
//!
//! - [`Behavior::allow`]: may a call proceed right now?
//! - [`Behavior::call`]: run the remainder of the pipeline, applying the behavior.
//!
//! `call` performs its own pre-check; callers never need to invoke `allow`
//! before `call`. Behaviors are stateful and are driven through `&mut self`,
//! so a single instance is used by one sender at a time.
//!
//! # Example
//!
//! ```
//! use mailrelay_core::{Behavior, DeliveryError, Next};
//!
//! /// Counts how many calls went through.
//! struct Counter {
//!     calls: usize,
//! }
//!
//! impl<T> Behavior<T> for Counter {
//!     fn name(&self) -> &str {
//!         "counter"
//!     }
//!
//!     fn allow(&mut self) -> bool {
//!         true
//!     }
//!
//!     fn call(&mut self, next: Next<'_, T>) -> Result<T, DeliveryError> {
//!         self.calls += 1;
//!         next()
//!     }
//! }
//!
//! let mut counter = Counter { calls: 0 };
//! let result: Result<u32, DeliveryError> = counter.call(&mut || Ok(7));
//! assert_eq!(result, Ok(7));
//! assert_eq!(counter.calls, 1);
//! ```

use crate::DeliveryError;

/// The wrapped invocation handed to a behavior: everything inside it in the
/// pipeline, ending with the backend call.
///
/// It is `FnMut` because a behavior such as retry may run it several times.
pub type Next<'a, T> = &'a mut dyn FnMut() -> Result<T, DeliveryError>;

/// A resilience behavior that can wrap a fallible call.
///
/// `T` is the success value flowing back out of the wrapped call. Behaviors
/// that don't care about the value implement the trait for every `T`.
pub trait Behavior<T>: Send {
    /// Returns the instance name, used in errors and logs.
    fn name(&self) -> &str;

    /// Returns whether a call may proceed now.
    ///
    /// This may update internal state: a rate limiter records the accepted
    /// call, a circuit breaker may move from open to half-open.
    fn allow(&mut self) -> bool;

    /// Runs `next` with this behavior applied.
    ///
    /// # Errors
    ///
    /// Returns the behavior's own rejection error when the pre-check fails,
    /// otherwise whatever error `next` produced.
    fn call(&mut self, next: Next<'_, T>) -> Result<T, DeliveryError>;
}

impl<T, B> Behavior<T> for Box<B>
where
    B: Behavior<T> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn allow(&mut self) -> bool {
        (**self).allow()
    }

    fn call(&mut self, next: Next<'_, T>) -> Result<T, DeliveryError> {
        (**self).call(next)
    }
}
