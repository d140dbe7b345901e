//! Circuit breaker for mailrelay delivery pipelines.
//!
//! A circuit breaker stops sending to a backend that keeps failing and
//! periodically lets a probe through to see whether it has recovered.
//!
//! ## States
//! - **Closed**: calls pass through; each failure is counted
//! - **Open**: the failure count reached the threshold; calls are refused with
//!   [`DeliveryError::CircuitOpen`] without touching the backend
//! - **Half-Open**: the reset timeout has elapsed since the last failure; the
//!   next successful call closes the circuit, a failure reopens it
//!
//! There is no background timer. The move from open to half-open happens as
//! a side effect of the pre-check ([`CircuitBreaker::allow_request`]), which
//! [`CircuitBreaker::execute`] runs before every call.
//!
//! ## Usage
//!
//! ```rust
//! use mailrelay_circuitbreaker::{CircuitBreaker, CircuitState};
//! use mailrelay_core::DeliveryError;
//! use std::time::Duration;
//!
//! let mut breaker = CircuitBreaker::builder()
//!     .name("sendgrid-cb")
//!     .failure_threshold(3)
//!     .reset_timeout(Duration::from_secs(10))
//!     .build();
//!
//! for _ in 0..3 {
//!     let _ = breaker.execute(|| Err::<(), _>(DeliveryError::backend("sendgrid", "timeout")));
//! }
//! assert_eq!(breaker.state(), CircuitState::Open);
//!
//! let err = breaker.execute(|| Ok(())).unwrap_err();
//! assert!(err.is_circuit_open());
//! ```
//!
//! ## Event Listeners
//!
//! ```rust
//! use mailrelay_circuitbreaker::CircuitBreaker;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let rejections = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&rejections);
//!
//! let breaker = CircuitBreaker::builder()
//!     .on_state_transition(|from, to| println!("{from} -> {to}"))
//!     .on_call_rejected(move || {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     })
//!     .build();
//! # drop(breaker);
//! ```

use mailrelay_core::{Behavior, DeliveryError, Next};
use std::fmt;
use std::time::{Duration, Instant};

pub use circuit::CircuitState;
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use events::CircuitBreakerEvent;

mod circuit;
mod config;
mod events;

use circuit::Circuit;

/// A circuit breaker guarding one backend.
pub struct CircuitBreaker {
    circuit: Circuit,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Creates a breaker with the given threshold and reset timeout and
    /// otherwise default settings.
    pub fn new(failure_threshold: usize, reset_timeout: Duration) -> Self {
        Self::builder()
            .failure_threshold(failure_threshold)
            .reset_timeout(reset_timeout)
            .build()
    }

    /// Returns a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    pub(crate) fn from_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuit: Circuit::default(),
            config,
        }
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.circuit.state()
    }

    /// Failures recorded since the last reset.
    pub fn failure_count(&self) -> usize {
        self.circuit.failure_count()
    }

    /// When the most recent failure was recorded.
    pub fn last_failure_time(&self) -> Option<Instant> {
        self.circuit.last_failure()
    }

    /// Returns `true` if the circuit is open.
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    /// The breaker's configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Closes the circuit and clears the failure history.
    pub fn reset(&mut self) {
        self.circuit.reset(&self.config);
    }

    /// Pre-check: may a call proceed now?
    ///
    /// An open circuit whose reset timeout has elapsed moves to half-open
    /// and returns `true`.
    pub fn allow_request(&mut self) -> bool {
        self.circuit.try_acquire(&self.config)
    }

    /// Runs `f` through the breaker.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::CircuitOpen`] without calling `f` when the
    /// pre-check fails, otherwise `f`'s own error unchanged.
    pub fn execute<T, F>(&mut self, f: F) -> Result<T, DeliveryError>
    where
        F: FnOnce() -> Result<T, DeliveryError>,
    {
        if !self.allow_request() {
            return Err(DeliveryError::CircuitOpen {
                name: self.config.name.clone(),
            });
        }

        match f() {
            Ok(value) => {
                self.circuit.record_success(&self.config);
                Ok(value)
            }
            Err(err) => {
                self.circuit.record_failure(&self.config);
                Err(err)
            }
        }
    }
}

impl<T> Behavior<T> for CircuitBreaker {
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

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.config.name)
            .field("state", &self.circuit.state())
            .field("failure_count", &self.circuit.failure_count())
            .finish()
    }
}
