//! Declarative relay configuration.
//!
//! A [`RelayConfig`] lists backends, the behaviors wrapped around each of
//! them and the failover strategy that chooses between them. It can be read
//! from JSON:
//!
//! ```json
//! {
//!   "failover": "sticky",
//!   "max_sweeps": 100,
//!   "backends": [
//!     {
//!       "name": "sendgrid",
//!       "behaviors": ["retry", "rl", "cb"],
//!       "rate_limiter": { "max_attempts": 10, "per_seconds": 5 },
//!       "circuit_breaker": { "threshold": 3, "reset_timeout": 10 },
//!       "retry": { "retries": 3 }
//!     }
//!   ]
//! }
//! ```
//!
//! The settings types also parse the compact comma-separated forms used on
//! the command line (`"3,10"` for a breaker, `"10,5"` for a limiter).

use crate::backend::{Backend, NoopBackend};
use crate::error::ConfigError;
use crate::failover::{Failover, StatelessFailover, StickyFailover, DEFAULT_MAX_SWEEPS};
use crate::pipeline::DeliveryPipeline;
use mailrelay_circuitbreaker::CircuitBreaker;
use mailrelay_core::{SharedClock, SharedSleeper, SystemClock, ThreadSleeper};
use mailrelay_ratelimiter::RateLimiter;
use mailrelay_retry::Retry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// The behaviors a pipeline can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorKind {
    #[serde(rename = "cb")]
    CircuitBreaker,
    #[serde(rename = "rl")]
    RateLimiter,
    #[serde(rename = "retry")]
    Retry,
}

impl BehaviorKind {
    /// Short name used in configuration and behavior names.
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorKind::CircuitBreaker => "cb",
            BehaviorKind::RateLimiter => "rl",
            BehaviorKind::Retry => "retry",
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BehaviorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cb" => Ok(BehaviorKind::CircuitBreaker),
            "rl" => Ok(BehaviorKind::RateLimiter),
            "retry" => Ok(BehaviorKind::Retry),
            other => Err(ConfigError::UnknownBehavior(other.to_string())),
        }
    }
}

/// Parses a comma-separated behavior list such as `"cb,rl"`.
///
/// An empty string yields an empty list.
pub fn parse_behaviors(list: &str) -> Result<Vec<BehaviorKind>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// Circuit breaker parameters. Compact form: `"threshold,reset_timeout"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    /// Failures that open the circuit.
    pub threshold: usize,
    /// Seconds the circuit stays open after its last failure.
    pub reset_timeout: u64,
}

impl CircuitBreakerSettings {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout)
    }
}

impl FromStr for CircuitBreakerSettings {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (threshold, reset_timeout) = pair(s, "circuit breaker", "threshold,reset_timeout")?;
        Ok(Self {
            threshold: number(threshold, "circuit breaker threshold")?,
            reset_timeout: number(reset_timeout, "circuit breaker reset timeout")?,
        })
    }
}

/// Rate limiter parameters. Compact form: `"max_attempts,per_seconds"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterSettings {
    pub max_attempts: usize,
    pub per_seconds: u64,
}

impl RateLimiterSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.per_seconds)
    }
}

impl FromStr for RateLimiterSettings {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (max_attempts, per_seconds) = pair(s, "rate limiter", "max_attempts,per_seconds")?;
        Ok(Self {
            max_attempts: number(max_attempts, "rate limiter max attempts")?,
            per_seconds: number(per_seconds, "rate limiter period")?,
        })
    }
}

/// Retry parameters. Compact form: `"retries"`.
///
/// Delays follow the default exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    pub retries: usize,
}

impl FromStr for RetrySettings {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            retries: number(s, "retry count")?,
        })
    }
}

fn pair<'a>(
    s: &'a str,
    field: &'static str,
    expected: &'static str,
) -> Result<(&'a str, &'a str), ConfigError> {
    s.split_once(',').ok_or_else(|| ConfigError::InvalidValue {
        field,
        value: s.to_string(),
        expected,
    })
}

fn number<N: FromStr>(s: &str, field: &'static str) -> Result<N, ConfigError> {
    s.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field,
        value: s.to_string(),
        expected: "a non-negative integer",
    })
}

/// One backend and the behaviors wrapped around it.
///
/// `behaviors` is ordered outermost first. Each listed behavior needs its
/// settings section; sections for behaviors that are not listed are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    #[serde(default, alias = "middlewares")]
    pub behaviors: Vec<BehaviorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limiter: Option<RateLimiterSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetrySettings>,
}

impl BackendConfig {
    /// A backend with no behaviors.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviors: Vec::new(),
            circuit_breaker: None,
            rate_limiter: None,
            retry: None,
        }
    }

    pub fn with_behaviors(mut self, behaviors: impl IntoIterator<Item = BehaviorKind>) -> Self {
        self.behaviors = behaviors.into_iter().collect();
        self
    }

    pub fn with_circuit_breaker(mut self, settings: CircuitBreakerSettings) -> Self {
        self.circuit_breaker = Some(settings);
        self
    }

    pub fn with_rate_limiter(mut self, settings: RateLimiterSettings) -> Self {
        self.rate_limiter = Some(settings);
        self
    }

    pub fn with_retry(mut self, settings: RetrySettings) -> Self {
        self.retry = Some(settings);
        self
    }

    /// Wraps `backend` in the configured behaviors using real time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSettings`] when a listed behavior has
    /// no settings section.
    pub fn build_pipeline(&self, backend: Arc<dyn Backend>) -> Result<DeliveryPipeline, ConfigError> {
        self.build_pipeline_with(backend, Arc::new(SystemClock), Arc::new(ThreadSleeper))
    }

    /// Like [`build_pipeline`](Self::build_pipeline) with explicit time
    /// sources for breakers, limiters and retries.
    pub fn build_pipeline_with(
        &self,
        backend: Arc<dyn Backend>,
        clock: SharedClock,
        sleeper: SharedSleeper,
    ) -> Result<DeliveryPipeline, ConfigError> {
        let mut pipeline = DeliveryPipeline::from_shared(backend);

        for kind in &self.behaviors {
            let name = format!("{}-{}", self.name, kind);
            let missing = || ConfigError::MissingSettings {
                backend: self.name.clone(),
                behavior: *kind,
            };

            match kind {
                BehaviorKind::CircuitBreaker => {
                    let settings = self.circuit_breaker.ok_or_else(missing)?;
                    pipeline.push(Box::new(
                        CircuitBreaker::builder()
                            .name(name)
                            .failure_threshold(settings.threshold)
                            .reset_timeout(settings.reset_timeout())
                            .clock(Arc::clone(&clock))
                            .build(),
                    ));
                }
                BehaviorKind::RateLimiter => {
                    let settings = self.rate_limiter.ok_or_else(missing)?;
                    pipeline.push(Box::new(
                        RateLimiter::builder()
                            .name(name)
                            .max_calls(settings.max_attempts)
                            .window(settings.window())
                            .clock(Arc::clone(&clock))
                            .build(),
                    ));
                }
                BehaviorKind::Retry => {
                    let settings = self.retry.ok_or_else(missing)?;
                    pipeline.push(Box::new(
                        Retry::builder()
                            .name(name)
                            .max_retries(settings.retries)
                            .sleeper(Arc::clone(&sleeper))
                            .clock(Arc::clone(&clock))
                            .build(),
                    ));
                }
            }
        }

        tracing::debug!(
            backend = %self.name,
            behaviors = ?pipeline.behavior_names().collect::<Vec<_>>(),
            "pipeline built"
        );
        Ok(pipeline)
    }
}

/// Which failover strategy chooses between pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailoverKind {
    Stateless,
    #[default]
    Sticky,
}

/// Backends plus the failover over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub failover: FailoverKind,
    /// Sweep budget for the sticky failover; ignored by the stateless one.
    #[serde(default = "default_max_sweeps")]
    pub max_sweeps: usize,
    pub backends: Vec<BackendConfig>,
}

fn default_max_sweeps() -> usize {
    DEFAULT_MAX_SWEEPS
}

impl Default for RelayConfig {
    /// A single backend named `Consumer` behind retry, a limiter of 10 calls
    /// per 5 seconds and a breaker opening after 3 failures for 10 seconds.
    fn default() -> Self {
        Self {
            failover: FailoverKind::Sticky,
            max_sweeps: DEFAULT_MAX_SWEEPS,
            backends: vec![BackendConfig::new("Consumer")
                .with_behaviors([
                    BehaviorKind::Retry,
                    BehaviorKind::RateLimiter,
                    BehaviorKind::CircuitBreaker,
                ])
                .with_rate_limiter(RateLimiterSettings {
                    max_attempts: 10,
                    per_seconds: 5,
                })
                .with_circuit_breaker(CircuitBreakerSettings {
                    threshold: 3,
                    reset_timeout: 10,
                })
                .with_retry(RetrySettings { retries: 3 })],
        }
    }
}

impl RelayConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Builds the failover with a [`NoopBackend`] per configured backend.
    pub fn build_failover(&self) -> Result<Box<dyn Failover>, ConfigError> {
        self.build_failover_with(|config| Arc::new(NoopBackend::new(config.name.clone())))
    }

    /// Builds the failover, asking `make_backend` for each transport.
    ///
    /// # Errors
    ///
    /// Fails on missing behavior settings or an empty backend list.
    pub fn build_failover_with<F>(&self, mut make_backend: F) -> Result<Box<dyn Failover>, ConfigError>
    where
        F: FnMut(&BackendConfig) -> Arc<dyn Backend>,
    {
        let pipelines = self
            .backends
            .iter()
            .map(|config| config.build_pipeline(make_backend(config)))
            .collect::<Result<Vec<_>, _>>()?;

        let failover: Box<dyn Failover> = match self.failover {
            FailoverKind::Stateless => Box::new(StatelessFailover::new(pipelines)?),
            FailoverKind::Sticky => {
                Box::new(StickyFailover::new(pipelines)?.with_max_sweeps(self.max_sweeps))
            }
        };
        Ok(failover)
    }
}
