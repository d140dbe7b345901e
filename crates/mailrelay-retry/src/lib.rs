//! Retry with backoff for mailrelay delivery pipelines.
//!
//! [`Retry`] runs the wrapped call up to `max_retries` times in total. After
//! each failure it asks its [`Backoff`] for a delay, blocks the calling
//! thread for that long, and tries again. When the last allowed attempt
//! fails, the error from that attempt is returned as-is and the attempt
//! counter goes back to zero, so the next message starts with a full budget.
//!
//! # Examples
//!
//! ```
//! use mailrelay_core::{DeliveryError, RecordingSleeper};
//! use mailrelay_retry::Retry;
//! use std::time::Duration;
//!
//! let sleeper = RecordingSleeper::new();
//! let mut retry = Retry::builder()
//!     .max_retries(3)
//!     .constant_backoff(Duration::from_millis(10))
//!     .sleeper(sleeper.clone())
//!     .build();
//!
//! let mut calls = 0;
//! let result = retry.execute(|| {
//!     calls += 1;
//!     if calls < 2 {
//!         Err(DeliveryError::backend("sendgrid", "503"))
//!     } else {
//!         Ok("accepted")
//!     }
//! });
//!
//! assert_eq!(result, Ok("accepted"));
//! assert_eq!(calls, 2);
//! assert_eq!(sleeper.delays(), vec![Duration::from_millis(10)]);
//! ```

mod backoff;
mod config;
mod events;

pub use backoff::{Backoff, ConstantBackoff, ExponentialBackoff, FnBackoff};
pub use config::{RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;

use mailrelay_core::{Behavior, DeliveryError, Next};
use std::fmt;

#[cfg(feature = "metrics")]
use metrics::counter;

/// Re-runs a failing call with a delay between attempts.
pub struct Retry {
    attempts: usize,
    config: RetryConfig,
}

impl Retry {
    /// Creates a retry allowing `max_retries` attempts with the default
    /// exponential backoff.
    pub fn new(max_retries: usize) -> Self {
        Self::builder().max_retries(max_retries).build()
    }

    /// Returns a new configuration builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    pub(crate) fn from_config(config: RetryConfig) -> Self {
        Self {
            attempts: 0,
            config,
        }
    }

    /// Failed attempts counted against the current call.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Total attempts allowed per call.
    pub fn max_retries(&self) -> usize {
        self.config.max_retries
    }

    /// Pre-check: is there budget left?
    pub fn allow_request(&self) -> bool {
        self.attempts < self.config.max_retries
    }

    /// Runs `f` until it succeeds or the budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::RetryExhausted`] without calling `f` when no
    /// budget is left on entry. Otherwise returns the error of the last
    /// failed attempt once the budget runs out.
    pub fn execute<T, F>(&mut self, mut f: F) -> Result<T, DeliveryError>
    where
        F: FnMut() -> Result<T, DeliveryError>,
    {
        if !self.allow_request() {
            return Err(DeliveryError::RetryExhausted {
                name: self.config.name.clone(),
                attempts: self.attempts,
            });
        }

        loop {
            match f() {
                Ok(value) => {
                    let attempts = self.attempts + 1;
                    self.attempts = 0;
                    self.emit(RetryEvent::Success {
                        pattern_name: self.config.name.clone(),
                        timestamp: self.config.clock.now(),
                        attempts,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("retry_calls_total", "retry" => self.config.name.clone(), "outcome" => "success").increment(1);

                    return Ok(value);
                }
                Err(err) => {
                    self.attempts += 1;

                    if !self.allow_request() {
                        let attempts = self.attempts;
                        self.attempts = 0;
                        self.emit(RetryEvent::Exhausted {
                            pattern_name: self.config.name.clone(),
                            timestamp: self.config.clock.now(),
                            attempts,
                        });

                        #[cfg(feature = "tracing")]
                        tracing::error!(retry = %self.config.name, attempts, error = %err, "retries exhausted");

                        #[cfg(feature = "metrics")]
                        counter!("retry_calls_total", "retry" => self.config.name.clone(), "outcome" => "exhausted").increment(1);

                        return Err(err);
                    }

                    let delay = self.config.backoff.delay(self.attempts);
                    self.emit(RetryEvent::Retry {
                        pattern_name: self.config.name.clone(),
                        timestamp: self.config.clock.now(),
                        attempt: self.attempts,
                        delay,
                    });

                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        retry = %self.config.name,
                        attempt = self.attempts,
                        max_retries = self.config.max_retries,
                        delay = ?delay,
                        error = %err,
                        "attempt failed, retrying"
                    );

                    #[cfg(feature = "metrics")]
                    counter!("retry_attempts_total", "retry" => self.config.name.clone()).increment(1);

                    self.config.sleeper.sleep(delay);
                }
            }
        }
    }

    fn emit(&self, event: RetryEvent) {
        self.config.event_listeners.emit(&event);
    }
}

impl<T> Behavior<T> for Retry {
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

impl fmt::Debug for Retry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("name", &self.config.name)
            .field("attempts", &self.attempts)
            .field("max_retries", &self.config.max_retries)
            .finish()
    }
}
