use mailrelay_core::{DeliveryError, RecordingSleeper};
use mailrelay_retry::Retry;
use std::time::Duration;

fn retry(max: usize) -> Retry {
    Retry::builder()
        .name("behavior")
        .max_retries(max)
        .constant_backoff(Duration::from_millis(10))
        .sleeper(RecordingSleeper::new())
        .build()
}

#[test]
fn gives_up_after_max_attempts_with_last_error() {
    let mut retry = retry(3);
    let mut calls = 0;

    let err = retry
        .execute(|| {
            calls += 1;
            Err::<(), _>(DeliveryError::backend("vendor", format!("failure {calls}")))
        })
        .unwrap_err();

    assert_eq!(calls, 3);
    assert_eq!(err, DeliveryError::backend("vendor", "failure 3"));
}

#[test]
fn stops_at_first_success() {
    let mut retry = retry(5);
    let mut calls = 0;

    let result = retry.execute(|| {
        calls += 1;
        if calls < 3 {
            Err(DeliveryError::backend("vendor", "busy"))
        } else {
            Ok(calls)
        }
    });

    assert_eq!(result, Ok(3));
    assert_eq!(retry.attempts(), 0);
}

#[test]
fn budget_is_per_call() {
    let mut retry = retry(2);

    let _ = retry.execute(|| Err::<(), _>(DeliveryError::backend("vendor", "down")));
    let mut calls = 0;
    let _ = retry.execute(|| {
        calls += 1;
        Err::<(), _>(DeliveryError::backend("vendor", "down"))
    });

    assert_eq!(calls, 2);
}

#[test]
fn zero_budget_refuses_without_calling() {
    let mut retry = retry(0);
    let mut called = false;

    let err = retry
        .execute(|| {
            called = true;
            Ok(())
        })
        .unwrap_err();

    assert!(!called);
    assert_eq!(
        err,
        DeliveryError::RetryExhausted {
            name: "behavior".to_string(),
            attempts: 0
        }
    );
}

#[test]
fn refusals_from_inner_layers_are_retried() {
    let mut retry = retry(3);
    let mut calls = 0;

    let result = retry.execute(|| {
        calls += 1;
        if calls == 1 {
            Err(DeliveryError::CircuitOpen {
                name: "inner-cb".to_string(),
            })
        } else {
            Ok("sent")
        }
    });

    assert_eq!(result, Ok("sent"));
    assert_eq!(calls, 2);
}
