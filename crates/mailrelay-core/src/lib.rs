//! Core infrastructure for mailrelay.
//!
//! This crate holds the pieces every resilience behavior and the delivery
//! pipeline agree on:
//! - [`Behavior`]: the pre-check + wrapped-invocation contract
//! - [`DeliveryError`]: the error every layer of a pipeline reports
//! - Event system for observing behaviors
//! - [`Clock`] and [`Sleeper`] time sources, swappable in tests

pub mod behavior;
pub mod clock;
pub mod error;
pub mod events;

pub use behavior::{Behavior, Next};
pub use clock::{
    Clock, ManualClock, RecordingSleeper, SharedClock, SharedSleeper, Sleeper, SystemClock,
    ThreadSleeper,
};
pub use error::DeliveryError;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
