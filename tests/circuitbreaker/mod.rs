//! Circuit breaker tests.
//!
//! Test organization:
//! - thresholds.rs: when the circuit opens
//! - half_open.rs: probing after the reset timeout
//! - reset.rs: manual reset
//! - events.rs: listeners and their failure isolation

mod thresholds;
