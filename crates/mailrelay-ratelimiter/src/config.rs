use crate::events::RateLimiterEvent;
use crate::RateLimiter;
use mailrelay_core::events::{EventListeners, FnListener};
use mailrelay_core::{Clock, SharedClock, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the rate limiter pattern.
pub struct RateLimiterConfig {
    pub(crate) max_calls: usize,
    pub(crate) window: Duration,
    pub(crate) clock: SharedClock,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) name: String,
}

impl RateLimiterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }
}

/// Builder for [`RateLimiterConfig`].
pub struct RateLimiterConfigBuilder {
    max_calls: usize,
    window: Duration,
    clock: SharedClock,
    event_listeners: EventListeners<RateLimiterEvent>,
    name: String,
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_calls: 50
    /// - window: 1 second
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_calls: 50,
            window: Duration::from_secs(1),
            clock: Arc::new(SystemClock),
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets how many calls may be admitted within any one window.
    pub fn max_calls(mut self, limit: usize) -> Self {
        self.max_calls = limit;
        self
    }

    /// Sets the length of the sliding window.
    pub fn window(mut self, duration: Duration) -> Self {
        self.window = duration;
        self
    }

    /// Replaces the time source.
    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Sets the name for this rate limiter instance (used in events and errors).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a call is admitted.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the number of calls in the window, this one included.
    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RateLimiterEvent| {
            if let RateLimiterEvent::PermitAcquired { in_window, .. } = event {
                f(*in_window);
            }
        }));
        self
    }

    /// Registers a callback when a call is refused.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - Called with the time until a slot frees up.
    ///
    /// # Example
    /// ```rust
    /// use mailrelay_ratelimiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let limiter = RateLimiter::builder()
    ///     .max_calls(10)
    ///     .window(Duration::from_secs(5))
    ///     .on_permit_rejected(|retry_after| {
    ///         println!("throttled, next slot in {:?}", retry_after);
    ///     })
    ///     .build();
    /// # drop(limiter);
    /// ```
    pub fn on_permit_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RateLimiterEvent| {
            if let RateLimiterEvent::PermitRejected { retry_after, .. } = event {
                f(*retry_after);
            }
        }));
        self
    }

    /// Builds the rate limiter.
    pub fn build(self) -> RateLimiter {
        RateLimiter::from_config(RateLimiterConfig {
            max_calls: self.max_calls,
            window: self.window,
            clock: self.clock,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
