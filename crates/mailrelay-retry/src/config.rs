use crate::backoff::{Backoff, ConstantBackoff, ExponentialBackoff};
use crate::events::RetryEvent;
use crate::Retry;
use mailrelay_core::events::{EventListeners, FnListener};
use mailrelay_core::{Clock, SharedClock, SharedSleeper, Sleeper, SystemClock, ThreadSleeper};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the retry behavior.
pub struct RetryConfig {
    pub(crate) max_retries: usize,
    pub(crate) backoff: Arc<dyn Backoff>,
    pub(crate) sleeper: SharedSleeper,
    pub(crate) clock: SharedClock,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

impl RetryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }
}

/// Builder for configuring retry behavior.
pub struct RetryConfigBuilder {
    max_retries: usize,
    backoff: Arc<dyn Backoff>,
    sleeper: SharedSleeper,
    clock: SharedClock,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl RetryConfigBuilder {
    /// Creates a new builder with default values.
    ///
    /// Defaults:
    /// - max_retries: 3
    /// - backoff: exponential, 1 second base, factor 2, capped at 60 seconds
    /// - sleeper: blocks the calling thread
    /// - clock: system monotonic clock, used for event timestamps
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            backoff: Arc::new(ExponentialBackoff::default()),
            sleeper: Arc::new(ThreadSleeper),
            clock: Arc::new(SystemClock),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the total number of attempts, the first call included.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Waits the same `delay` before every retry.
    pub fn constant_backoff(mut self, delay: Duration) -> Self {
        self.backoff = Arc::new(ConstantBackoff::new(delay));
        self
    }

    /// Doubles the delay from `base` on each retry, up to 60 seconds.
    pub fn exponential_backoff(mut self, base: Duration) -> Self {
        self.backoff = Arc::new(ExponentialBackoff::new(base));
        self
    }

    /// Sets a custom backoff strategy.
    pub fn backoff<B>(mut self, backoff: B) -> Self
    where
        B: Backoff + 'static,
    {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Replaces how the behavior waits between attempts.
    pub fn sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Replaces the time source that stamps emitted events.
    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Give this retry a human-readable name for observability.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback before each retry.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration)` - the number of failed attempts so far and the
    /// delay about to be slept.
    ///
    /// # Example
    /// ```rust
    /// use mailrelay_retry::Retry;
    ///
    /// let retry = Retry::builder()
    ///     .on_retry(|attempt, delay| {
    ///         println!("attempt {attempt} failed, retrying in {delay:?}");
    ///     })
    ///     .build();
    /// # drop(retry);
    /// ```
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RetryEvent| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback when the wrapped call succeeds.
    ///
    /// Called with the number of attempts it took.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RetryEvent| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when every allowed attempt has failed.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RetryEvent| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback for every retry event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&RetryEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Builds the retry behavior.
    pub fn build(self) -> Retry {
        Retry::from_config(RetryConfig {
            max_retries: self.max_retries,
            backoff: self.backoff,
            sleeper: self.sleeper,
            clock: self.clock,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
