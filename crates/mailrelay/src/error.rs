//! Errors raised outside a single delivery attempt.

use crate::config::BehaviorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a failover as a whole.
///
/// A message that simply could not be delivered is not an error: `send`
/// reports it as `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailoverError {
    /// A failover was built without any pipeline.
    #[error("failover needs at least one pipeline")]
    NoPipelines,

    /// Every pipeline kept failing for more full sweeps than allowed.
    #[error("every pipeline failed for {sweeps} consecutive sweeps")]
    MaxSweepsReached {
        /// Sweeps completed when the failover gave up.
        sweeps: usize,
    },
}

impl FailoverError {
    /// Returns `true` for [`FailoverError::MaxSweepsReached`].
    pub fn is_max_sweeps(&self) -> bool {
        matches!(self, FailoverError::MaxSweepsReached { .. })
    }
}

/// Invalid or unreadable relay configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown behavior '{0}', expected one of: cb, rl, retry")]
    UnknownBehavior(String),

    #[error("backend '{backend}' lists behavior '{behavior}' but has no settings for it")]
    MissingSettings {
        backend: String,
        behavior: BehaviorKind,
    },

    #[error("invalid {field} '{value}': expected {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("expected {expected} {field} entries, got {actual}")]
    CountMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Failover(#[from] FailoverError),
}

/// Failure to use the in-memory queue.
#[cfg(feature = "queue")]
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("queue '{0}' is closed")]
    Closed(&'static str),
}
