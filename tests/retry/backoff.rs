use mailrelay_core::{DeliveryError, RecordingSleeper};
use mailrelay_retry::{Backoff, ExponentialBackoff, FnBackoff, Retry};
use std::time::Duration;

fn always_failing(retry: &mut Retry) {
    let _ = retry.execute(|| Err::<(), _>(DeliveryError::backend("vendor", "down")));
}

#[test]
fn sleeps_between_attempts_only() {
    let sleeper = RecordingSleeper::new();
    let mut retry = Retry::builder()
        .max_retries(4)
        .constant_backoff(Duration::from_millis(250))
        .sleeper(sleeper.clone())
        .build();

    always_failing(&mut retry);

    assert_eq!(sleeper.delays(), vec![Duration::from_millis(250); 3]);
    assert_eq!(sleeper.total(), Duration::from_millis(750));
}

#[test]
fn exponential_delays_grow_from_first_retry() {
    let sleeper = RecordingSleeper::new();
    let mut retry = Retry::builder()
        .max_retries(4)
        .exponential_backoff(Duration::from_secs(1))
        .sleeper(sleeper.clone())
        .build();

    always_failing(&mut retry);

    assert_eq!(
        sleeper.delays(),
        vec![
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8)
        ]
    );
}

#[test]
fn exponential_is_capped() {
    let backoff = ExponentialBackoff::new(Duration::from_secs(1)).max_delay(Duration::from_secs(60));
    assert_eq!(backoff.delay(5), Duration::from_secs(32));
    assert_eq!(backoff.delay(6), Duration::from_secs(60));
    assert_eq!(backoff.delay(10_000), Duration::from_secs(60));
}

#[test]
fn custom_backoff_sees_attempt_numbers() {
    let sleeper = RecordingSleeper::new();
    let mut retry = Retry::builder()
        .max_retries(3)
        .backoff(FnBackoff::new(|attempt| Duration::from_millis(attempt as u64 * 100)))
        .sleeper(sleeper.clone())
        .build();

    always_failing(&mut retry);

    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
}

#[test]
fn no_sleep_after_success() {
    let sleeper = RecordingSleeper::new();
    let mut retry = Retry::builder()
        .max_retries(3)
        .constant_backoff(Duration::from_secs(1))
        .sleeper(sleeper.clone())
        .build();

    retry.execute(|| Ok(())).unwrap();
    assert!(sleeper.delays().is_empty());
}
