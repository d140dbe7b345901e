use mailrelay_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by the rate limiter.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A call was admitted and recorded in the log.
    PermitAcquired {
        pattern_name: String,
        timestamp: Instant,
        /// Calls in the window, including this one.
        in_window: usize,
    },
    /// A call was refused because the window is full.
    PermitRejected {
        pattern_name: String,
        timestamp: Instant,
        /// Time until the oldest logged call leaves the window.
        retry_after: Duration,
    },
}

impl ResilienceEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::PermitAcquired { .. } => "permit_acquired",
            RateLimiterEvent::PermitRejected { .. } => "permit_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::PermitAcquired { timestamp, .. }
            | RateLimiterEvent::PermitRejected { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RateLimiterEvent::PermitAcquired { pattern_name, .. }
            | RateLimiterEvent::PermitRejected { pattern_name, .. } => pattern_name,
        }
    }
}
