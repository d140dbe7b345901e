//! Sliding-log rate limiter for mailrelay delivery pipelines.
//!
//! The limiter keeps the timestamps of admitted calls. Before each call it
//! drops every timestamp at least one window old and admits the call if
//! fewer than `max_calls` remain. Refused calls fail immediately with
//! [`DeliveryError::RateLimited`]; nothing waits for a slot.
//!
//! A call that was admitted keeps its slot whether the backend then
//! succeeds or fails.
//!
//! # Examples
//!
//! ```
//! use mailrelay_ratelimiter::RateLimiter;
//! use std::time::Duration;
//!
//! let mut limiter = RateLimiter::new(2, Duration::from_secs(60));
//!
//! assert!(limiter.execute(|| Ok(())).is_ok());
//! assert!(limiter.execute(|| Ok(())).is_ok());
//! assert!(limiter.execute(|| Ok(())).unwrap_err().is_rate_limited());
//! ```

use mailrelay_core::{Behavior, DeliveryError, Next};
use std::fmt;
use std::time::Duration;

mod config;
mod events;
mod limiter;

pub use config::{RateLimiterConfig, RateLimiterConfigBuilder};
pub use events::RateLimiterEvent;

use limiter::SlidingLog;

#[cfg(feature = "metrics")]
use metrics::counter;

/// Admits at most `max_calls` calls in any sliding window.
pub struct RateLimiter {
    log: SlidingLog,
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Creates a limiter with default name and clock.
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self::builder().max_calls(max_calls).window(window).build()
    }

    /// Returns a new configuration builder.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }

    pub(crate) fn from_config(config: RateLimiterConfig) -> Self {
        Self {
            log: SlidingLog::new(config.max_calls, config.window),
            config,
        }
    }

    /// Calls allowed per window.
    pub fn max_calls(&self) -> usize {
        self.log.max_calls()
    }

    /// Length of the window.
    pub fn window(&self) -> Duration {
        self.log.window()
    }

    /// Calls currently counted against the window.
    pub fn in_window(&mut self) -> usize {
        let now = self.config.clock.now();
        self.log.in_window(now)
    }

    /// Pre-check. An admitted call is recorded immediately.
    pub fn allow_request(&mut self) -> bool {
        let now = self.config.clock.now();
        match self.log.try_acquire(now) {
            Ok(in_window) => {
                self.config
                    .event_listeners
                    .emit(&RateLimiterEvent::PermitAcquired {
                        pattern_name: self.config.name.clone(),
                        timestamp: now,
                        in_window,
                    });

                #[cfg(feature = "metrics")]
                counter!("ratelimiter_calls_total", "ratelimiter" => self.config.name.clone(), "result" => "permitted").increment(1);

                true
            }
            Err(retry_after) => {
                self.config
                    .event_listeners
                    .emit(&RateLimiterEvent::PermitRejected {
                        pattern_name: self.config.name.clone(),
                        timestamp: now,
                        retry_after,
                    });

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    limiter = %self.config.name,
                    max_calls = self.log.max_calls(),
                    window = ?self.log.window(),
                    retry_after = ?retry_after,
                    "rate limit reached"
                );

                #[cfg(feature = "metrics")]
                counter!("ratelimiter_calls_total", "ratelimiter" => self.config.name.clone(), "result" => "rejected").increment(1);

                false
            }
        }
    }

    /// Runs `f` if the window has room.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::RateLimited`] without calling `f` when the
    /// window is full, otherwise `f`'s own error unchanged.
    pub fn execute<T, F>(&mut self, f: F) -> Result<T, DeliveryError>
    where
        F: FnOnce() -> Result<T, DeliveryError>,
    {
        if !self.allow_request() {
            return Err(DeliveryError::RateLimited {
                name: self.config.name.clone(),
                max_calls: self.log.max_calls(),
                window: self.log.window(),
            });
        }
        f()
    }
}

impl<T> Behavior<T> for RateLimiter {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn allow(&mut self) -> bool {
        self.allow_request()
    }

    fn call(&mut self, next: Next<'_, T>) -> Result<T, DeliveryError> {
        self.execute(next)
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.config.name)
            .field("log", &self.log)
            .finish()
    }
}
