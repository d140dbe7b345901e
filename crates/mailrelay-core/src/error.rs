//! The error type reported by every layer of a delivery pipeline.
//!
//! Behaviors and backends share one error type so that a failure raised deep
//! inside a pipeline can travel outward through every wrapper unchanged.
//! Each variant corresponds to one failure source:
//!
//! | Variant | Raised by |
//! |---|---|
//! | [`DeliveryError::Backend`] | the delivery backend itself |
//! | [`DeliveryError::CircuitOpen`] | a circuit breaker refusing the call |
//! | [`DeliveryError::RateLimited`] | a rate limiter refusing the call |
//! | [`DeliveryError::RetryExhausted`] | a retry with no budget left on entry |
//!
//! A retry that runs out of attempts while calling its inner function
//! re-raises the inner function's last error rather than wrapping it.
//!
//! ```
//! use mailrelay_core::DeliveryError;
//!
//! let err = DeliveryError::backend("sendgrid", "connection refused");
//! assert!(err.is_backend());
//! assert_eq!(err.to_string(), "backend 'sendgrid' failed: connection refused");
//! ```

use std::time::Duration;
use thiserror::Error;

/// Failure of a delivery attempt at any layer of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The backend rejected the message or failed to reach its transport.
    #[error("backend '{backend}' failed: {reason}")]
    Backend {
        /// Name of the backend.
        backend: String,
        /// Backend-provided description.
        reason: String,
    },

    /// A circuit breaker is open and refused the call.
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen {
        /// Name of the breaker.
        name: String,
    },

    /// A rate limiter refused the call.
    #[error("rate limiter '{name}' refused call: limit of {max_calls} calls per {window:?} reached")]
    RateLimited {
        /// Name of the limiter.
        name: String,
        /// Calls allowed per window.
        max_calls: usize,
        /// Length of the sliding window.
        window: Duration,
    },

    /// A retry had no attempts left when it was entered.
    #[error("retry '{name}' has no attempts left ({attempts} used)")]
    RetryExhausted {
        /// Name of the retry.
        name: String,
        /// Attempts already counted against the budget.
        attempts: usize,
    },
}

impl DeliveryError {
    /// Shorthand for [`DeliveryError::Backend`].
    pub fn backend(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        DeliveryError::Backend {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the backend itself failed.
    pub fn is_backend(&self) -> bool {
        matches!(self, DeliveryError::Backend { .. })
    }

    /// Returns `true` if a circuit breaker refused the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, DeliveryError::CircuitOpen { .. })
    }

    /// Returns `true` if a rate limiter refused the call.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DeliveryError::RateLimited { .. })
    }

    /// Returns `true` if a retry had no budget left.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, DeliveryError::RetryExhausted { .. })
    }

    /// Returns `true` if a behavior refused the call before the backend ran.
    pub fn is_rejection(&self) -> bool {
        !self.is_backend()
    }
}
