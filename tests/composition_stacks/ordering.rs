use crate::common::{message, FlakyBackend};
use mailrelay::circuitbreaker::CircuitBreaker;
use mailrelay::core::{ManualClock, RecordingSleeper};
use mailrelay::ratelimiter::RateLimiter;
use mailrelay::retry::Retry;
use mailrelay::DeliveryPipeline;
use std::time::Duration;

fn breaker(threshold: usize, clock: &ManualClock) -> CircuitBreaker {
    CircuitBreaker::builder()
        .name("stack-cb")
        .failure_threshold(threshold)
        .reset_timeout(Duration::from_secs(10))
        .clock(clock.clone())
        .build()
}

fn retry(max: usize, sleeper: &RecordingSleeper) -> Retry {
    Retry::builder()
        .name("stack-retry")
        .max_retries(max)
        .constant_backoff(Duration::from_secs(1))
        .sleeper(sleeper.clone())
        .build()
}

#[test]
fn retry_outside_breaker_retries_through_open_circuit() {
    let clock = ManualClock::new();
    let sleeper = RecordingSleeper::advancing(clock.clone());
    let backend = FlakyBackend::broken("vendor");

    let mut pipeline = DeliveryPipeline::from_shared(backend.clone())
        .with_behavior(retry(5, &sleeper))
        .with_behavior(breaker(2, &clock));

    let err = pipeline.attempt(&message(0)).unwrap_err();

    // two real failures open the circuit, the remaining attempts are refused
    assert_eq!(backend.calls(), 2);
    assert!(err.is_circuit_open());
    assert_eq!(sleeper.delays().len(), 4);
}

#[test]
fn breaker_outside_retry_counts_one_failure_per_call() {
    let clock = ManualClock::new();
    let sleeper = RecordingSleeper::advancing(clock.clone());
    let backend = FlakyBackend::broken("vendor");
    let cb = breaker(2, &clock);

    let mut pipeline = DeliveryPipeline::from_shared(backend.clone())
        .with_behavior(cb)
        .with_behavior(retry(3, &sleeper));

    assert!(pipeline.attempt(&message(0)).unwrap_err().is_backend());
    assert_eq!(backend.calls(), 3);

    assert!(pipeline.attempt(&message(1)).unwrap_err().is_backend());
    assert_eq!(backend.calls(), 6);

    assert!(pipeline.attempt(&message(2)).unwrap_err().is_circuit_open());
    assert_eq!(backend.calls(), 6);
}

#[test]
fn retry_waits_out_the_reset_timeout() {
    let clock = ManualClock::new();
    let sleeper = RecordingSleeper::advancing(clock.clone());
    let backend = FlakyBackend::failing_first("vendor", 1);

    let mut pipeline = DeliveryPipeline::from_shared(backend.clone())
        .with_behavior(
            Retry::builder()
                .max_retries(3)
                .constant_backoff(Duration::from_secs(10))
                .sleeper(sleeper.clone())
                .build(),
        )
        .with_behavior(breaker(1, &clock));

    // first attempt fails and opens the circuit; the ten second backoff
    // lets the second attempt through as a half-open probe
    let receipt = pipeline.attempt(&message(0)).unwrap();
    assert_eq!(receipt.backend, "vendor");
    assert_eq!(backend.calls(), 2);
}

#[test]
fn limiter_inside_retry_spends_a_permit_per_attempt() {
    let clock = ManualClock::new();
    let sleeper = RecordingSleeper::advancing(clock.clone());
    let backend = FlakyBackend::broken("vendor");

    let mut pipeline = DeliveryPipeline::from_shared(backend.clone())
        .with_behavior(retry(4, &sleeper))
        .with_behavior(
            RateLimiter::builder()
                .max_calls(2)
                .window(Duration::from_secs(60))
                .clock(clock.clone())
                .build(),
        );

    let err = pipeline.attempt(&message(0)).unwrap_err();
    assert_eq!(backend.calls(), 2);
    assert!(err.is_rate_limited());
}

#[test]
fn full_stack_on_a_healthy_backend_is_transparent() {
    let clock = ManualClock::new();
    let sleeper = RecordingSleeper::advancing(clock.clone());
    let backend = FlakyBackend::healthy("vendor");
    let cb = breaker(3, &clock);

    let mut pipeline = DeliveryPipeline::from_shared(backend.clone())
        .with_behavior(retry(3, &sleeper))
        .with_behavior(
            RateLimiter::builder()
                .max_calls(100)
                .window(Duration::from_secs(1))
                .clock(clock.clone())
                .build(),
        )
        .with_behavior(cb);

    for i in 0..50 {
        pipeline.attempt(&message(i)).unwrap();
    }
    assert_eq!(backend.calls(), 50);
    assert!(sleeper.delays().is_empty());
    assert_eq!(
        pipeline.behavior_names().collect::<Vec<_>>(),
        vec!["stack-retry", "<unnamed>", "stack-cb"]
    );
}
