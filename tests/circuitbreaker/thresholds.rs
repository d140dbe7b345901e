use mailrelay_circuitbreaker::{CircuitBreaker, CircuitState};
use mailrelay_core::{DeliveryError, ManualClock};
use std::time::Duration;

fn fail() -> Result<(), DeliveryError> {
    Err(DeliveryError::backend("vendor", "timeout"))
}

fn breaker(threshold: usize, clock: &ManualClock) -> CircuitBreaker {
    CircuitBreaker::builder()
        .name("thresholds")
        .failure_threshold(threshold)
        .reset_timeout(Duration::from_secs(10))
        .clock(clock.clone())
        .build()
}

#[test]
fn opens_exactly_at_threshold() {
    let clock = ManualClock::new();
    let mut cb = breaker(3, &clock);

    for expected in 1..3 {
        let _ = cb.execute(fail);
        assert_eq!(cb.failure_count(), expected);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    let _ = cb.execute(fail);
    assert_eq!(cb.state(), CircuitState::Open);
}

#[test]
fn successes_while_closed_do_not_clear_failures() {
    let clock = ManualClock::new();
    let mut cb = breaker(3, &clock);

    let _ = cb.execute(fail);
    cb.execute(|| Ok(())).unwrap();
    let _ = cb.execute(fail);
    cb.execute(|| Ok(())).unwrap();
    assert_eq!(cb.failure_count(), 2);

    let _ = cb.execute(fail);
    assert!(cb.is_open());
}

#[test]
fn threshold_of_one_opens_on_first_failure() {
    let clock = ManualClock::new();
    let mut cb = breaker(1, &clock);

    assert!(cb.execute(fail).unwrap_err().is_backend());
    assert!(cb.execute(|| Ok(())).unwrap_err().is_circuit_open());
}

#[test]
fn open_circuit_reports_its_name() {
    let clock = ManualClock::new();
    let mut cb = breaker(1, &clock);
    let _ = cb.execute(fail);

    assert_eq!(
        cb.execute(|| Ok(())),
        Err(DeliveryError::CircuitOpen {
            name: "thresholds".to_string()
        })
    );
}
