use crate::common::{message, FlakyBackend};
use mailrelay::core::{ManualClock, RecordingSleeper};
use mailrelay::{
    Backend, BackendConfig, BehaviorKind, DeliveryError, Failover, RateLimiterSettings,
    RelayConfig, RetrySettings,
};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn configured_pipeline_wraps_backend_in_listed_order() {
    let clock = ManualClock::new();
    let sleeper = RecordingSleeper::advancing(clock.clone());
    let backend = FlakyBackend::failing_first("vendor1", 2);

    let config = BackendConfig::new("vendor1")
        .with_behaviors([BehaviorKind::Retry, BehaviorKind::RateLimiter])
        .with_retry(RetrySettings { retries: 3 })
        .with_rate_limiter(RateLimiterSettings {
            max_attempts: 10,
            per_seconds: 5,
        });

    let mut pipeline = config
        .build_pipeline_with(backend.clone(), Arc::new(clock.clone()), Arc::new(sleeper.clone()))
        .unwrap();

    let receipt = pipeline.attempt(&message(0)).unwrap();
    assert_eq!(receipt.backend, "vendor1");
    assert_eq!(backend.calls(), 3);
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(2), Duration::from_secs(4)]);
}

#[test]
fn limiter_outside_retry_counts_one_permit_per_attempt() {
    let clock = ManualClock::new();
    let sleeper = RecordingSleeper::advancing(clock.clone());
    let backend = FlakyBackend::broken("vendor1");

    let config = BackendConfig::new("vendor1")
        .with_behaviors([BehaviorKind::RateLimiter, BehaviorKind::Retry])
        .with_retry(RetrySettings { retries: 3 })
        .with_rate_limiter(RateLimiterSettings {
            max_attempts: 1,
            per_seconds: 60,
        });
    let mut pipeline = config
        .build_pipeline_with(backend.clone(), Arc::new(clock.clone()), Arc::new(sleeper))
        .unwrap();

    // the limiter admits the whole retried call once
    assert!(pipeline.attempt(&message(0)).unwrap_err().is_backend());
    assert_eq!(backend.calls(), 3);
    assert!(matches!(
        pipeline.attempt(&message(1)),
        Err(DeliveryError::RateLimited { ref name, .. }) if name == "vendor1-rl"
    ));
}

#[test]
fn relay_config_from_json_builds_a_working_failover() {
    let config = RelayConfig::from_json(
        r#"{
            "failover": "sticky",
            "max_sweeps": 3,
            "backends": [
                {
                    "name": "sendgrid",
                    "behaviors": ["cb"],
                    "circuit_breaker": { "threshold": 1, "reset_timeout": 60 }
                },
                { "name": "mailgun", "behaviors": [] }
            ]
        }"#,
    )
    .unwrap();

    let primary = FlakyBackend::broken("sendgrid");
    let secondary = FlakyBackend::healthy("mailgun");
    let (p, s): (Arc<dyn Backend>, Arc<dyn Backend>) = (primary.clone(), secondary.clone());
    let mut failover = config
        .build_failover_with(move |backend| match backend.name.as_str() {
            "sendgrid" => p.clone(),
            _ => s.clone(),
        })
        .unwrap();

    for i in 0..3 {
        assert_eq!(failover.send(&message(i)), Ok(true));
    }
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 3);
}

#[test]
fn default_config_matches_consumer_setup() {
    let config = RelayConfig::default();
    let json = serde_json::to_value(&config).unwrap();

    assert_eq!(json["failover"], "sticky");
    assert_eq!(json["backends"][0]["name"], "Consumer");
    assert_eq!(
        json["backends"][0]["behaviors"],
        serde_json::json!(["retry", "rl", "cb"])
    );
    assert_eq!(RelayConfig::from_json(&json.to_string()).unwrap(), config);
}
