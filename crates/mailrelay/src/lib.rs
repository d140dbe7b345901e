//! Resilient email delivery across interchangeable backends.
//!
//! A [`Backend`] delivers a [`Message`]. A [`DeliveryPipeline`] wraps one
//! backend in an ordered stack of behaviors (circuit breaker, rate limiter,
//! retry) so every attempt passes through each of them. A [`Failover`]
//! holds several pipelines and picks which one delivers.
//!
//! ```
//! use mailrelay::circuitbreaker::CircuitBreaker;
//! use mailrelay::ratelimiter::RateLimiter;
//! use mailrelay::retry::Retry;
//! use mailrelay::{DeliveryPipeline, Message, NoopBackend, StickyFailover};
//! use std::time::Duration;
//!
//! let primary = DeliveryPipeline::new(NoopBackend::new("sendgrid"))
//!     .with_behavior(Retry::new(2))
//!     .with_behavior(RateLimiter::new(10, Duration::from_secs(5)))
//!     .with_behavior(CircuitBreaker::new(3, Duration::from_secs(10)));
//! let secondary = DeliveryPipeline::new(NoopBackend::new("mailgun"));
//!
//! let mut failover = StickyFailover::new(vec![primary, secondary])?.with_max_sweeps(100);
//!
//! let message = Message::new("Welcome", "Hello!", ["ada@example.com"], "noreply@example.com");
//! assert!(failover.send(&message)?);
//! # Ok::<(), mailrelay::FailoverError>(())
//! ```
//!
//! Pipelines can also be assembled from a [`RelayConfig`], which is how the
//! `mailrelay` command line tool builds them.
//!
//! ## Feature flags
//!
//! - `tracing` (default): log from inside the behaviors
//! - `metrics`: count behavior outcomes through the `metrics` facade
//! - `queue` (default): the in-memory queue in [`queue`]

pub use mailrelay_circuitbreaker as circuitbreaker;
pub use mailrelay_core as core;
pub use mailrelay_ratelimiter as ratelimiter;
pub use mailrelay_retry as retry;

pub use mailrelay_core::{Behavior, DeliveryError};

pub use backend::{Backend, NoopBackend, Receipt};
pub use config::{
    parse_behaviors, BackendConfig, BehaviorKind, CircuitBreakerSettings, FailoverKind,
    RateLimiterSettings, RelayConfig, RetrySettings,
};
pub use error::{ConfigError, FailoverError};
pub use failover::{Failover, StatelessFailover, StickyFailover, DEFAULT_MAX_SWEEPS};
pub use message::{Message, MessageDto};
pub use pipeline::{BoxBehavior, DeliveryPipeline};

#[cfg(feature = "queue")]
pub use error::QueueError;
#[cfg(feature = "queue")]
pub use queue::{ConsumerReport, QueueConsumer, QueueProducer, UnackedMessage};

mod backend;
mod config;
mod error;
mod failover;
mod message;
mod pipeline;
#[cfg(feature = "queue")]
pub mod queue;
