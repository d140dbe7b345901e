//! Retry tests.
//!
//! - behavior.rs: attempt counting and error propagation
//! - backoff.rs: delays between attempts
//! - events.rs: retry listeners

mod backoff;
mod behavior;
