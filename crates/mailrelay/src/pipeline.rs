//! One backend wrapped in an ordered stack of behaviors.

use crate::backend::{Backend, Receipt};
use crate::Message;
use mailrelay_core::{Behavior, DeliveryError};
use std::fmt;
use std::sync::Arc;

/// A boxed behavior over pipeline results.
pub type BoxBehavior = Box<dyn Behavior<Receipt>>;

/// A backend and the behaviors wrapped around it.
///
/// The first behavior added is the outermost: for behaviors `[A, B, C]` an
/// attempt enters `A`, which calls into `B`, then `C`, then the backend.
/// Each behavior runs its own pre-check. Errors travel back out through
/// every layer untouched; the pipeline itself neither logs nor swallows them.
///
/// ```
/// use mailrelay::{DeliveryPipeline, Message, NoopBackend};
/// use mailrelay::circuitbreaker::CircuitBreaker;
/// use mailrelay::ratelimiter::RateLimiter;
/// use std::time::Duration;
///
/// let mut pipeline = DeliveryPipeline::new(NoopBackend::new("sendgrid"))
///     .with_behavior(CircuitBreaker::new(3, Duration::from_secs(10)))
///     .with_behavior(RateLimiter::new(10, Duration::from_secs(5)));
///
/// let message = Message::new("Hello", "Body", ["to@example.com"], "from@example.com");
/// let receipt = pipeline.attempt(&message).unwrap();
/// assert_eq!(receipt.backend, "sendgrid");
/// ```
pub struct DeliveryPipeline {
    backend: Arc<dyn Backend>,
    behaviors: Vec<BoxBehavior>,
}

impl DeliveryPipeline {
    /// Creates a pipeline with no behaviors.
    pub fn new<B>(backend: B) -> Self
    where
        B: Backend + 'static,
    {
        Self::from_shared(Arc::new(backend))
    }

    /// Creates a pipeline around an already shared backend.
    pub fn from_shared(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            behaviors: Vec::new(),
        }
    }

    /// Adds `behavior` inside every behavior added so far.
    pub fn with_behavior<B>(mut self, behavior: B) -> Self
    where
        B: Behavior<Receipt> + 'static,
    {
        self.behaviors.push(Box::new(behavior));
        self
    }

    /// Adds an already boxed behavior inside every behavior added so far.
    pub fn push(&mut self, behavior: BoxBehavior) {
        self.behaviors.push(behavior);
    }

    /// Name of the wrapped backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Behavior names, outermost first.
    pub fn behavior_names(&self) -> impl Iterator<Item = &str> {
        self.behaviors.iter().map(|b| Behavior::<Receipt>::name(&**b))
    }

    /// Number of behaviors.
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Returns `true` if the backend is called directly.
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Sends `message` through every behavior to the backend.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any layer, unchanged.
    pub fn attempt(&mut self, message: &Message) -> Result<Receipt, DeliveryError> {
        invoke(&mut self.behaviors, self.backend.as_ref(), message)
    }
}

/// Runs the head of `behaviors` around a call that recurses into the tail,
/// ending with the backend.
fn invoke(
    behaviors: &mut [BoxBehavior],
    backend: &dyn Backend,
    message: &Message,
) -> Result<Receipt, DeliveryError> {
    match behaviors.split_first_mut() {
        None => backend.deliver(message),
        Some((outer, rest)) => {
            Behavior::<Receipt>::call(&mut **outer, &mut || invoke(rest, backend, message))
        }
    }
}

impl fmt::Debug for DeliveryPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryPipeline")
            .field("backend", &self.backend.name())
            .field("behaviors", &self.behavior_names().collect::<Vec<_>>())
            .finish()
    }
}
