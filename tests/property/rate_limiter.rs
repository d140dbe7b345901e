//! Property tests for the rate limiter.
//!
//! Invariants tested:
//! - No window ever holds more admitted calls than the limit
//! - With no time passing, exactly `min(limit, calls)` are admitted

use mailrelay_core::ManualClock;
use mailrelay_ratelimiter::RateLimiter;
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: any window-sized span contains at most `max_calls` admissions
    #[test]
    fn sliding_window_never_exceeds_limit(
        max_calls in 1usize..=10,
        window_ms in 10u64..=1_000,
        gaps in prop::collection::vec(0u64..=300, 1..200),
    ) {
        let clock = ManualClock::new();
        let window = Duration::from_millis(window_ms);
        let mut limiter = RateLimiter::builder()
            .max_calls(max_calls)
            .window(window)
            .clock(clock.clone())
            .build();

        let mut elapsed = 0u64;
        let mut admitted = Vec::new();
        for gap in gaps {
            clock.advance(Duration::from_millis(gap));
            elapsed += gap;
            if limiter.allow_request() {
                admitted.push(elapsed);
            }
        }

        for (i, &at) in admitted.iter().enumerate() {
            let in_window = admitted[..=i]
                .iter()
                .filter(|&&earlier| at - earlier < window_ms)
                .count();
            prop_assert!(
                in_window <= max_calls,
                "{} calls admitted within {}ms, limit {}",
                in_window,
                window_ms,
                max_calls
            );
        }
    }

    /// Property: a frozen clock admits exactly the first `max_calls` calls
    #[test]
    fn frozen_clock_admits_exactly_limit(
        max_calls in 0usize..=20,
        calls in 0usize..=50,
    ) {
        let clock = ManualClock::new();
        let mut limiter = RateLimiter::builder()
            .max_calls(max_calls)
            .window(Duration::from_secs(1))
            .clock(clock)
            .build();

        let admitted = (0..calls).filter(|_| limiter.allow_request()).count();
        prop_assert_eq!(admitted, calls.min(max_calls));
    }
}
