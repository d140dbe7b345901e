//! Property tests for the failovers.
//!
//! Invariants tested:
//! - The sticky pointer always stays within the pipeline list
//! - A send succeeds whenever some pipeline is healthy
//! - A hopeless send costs exactly `n × (max_sweeps + 1)` attempts
//! - Once exhausted, each further hopeless send costs one attempt

use crate::common::{message, FlakyBackend};
use mailrelay::{DeliveryPipeline, StatelessFailover, StickyFailover};
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: pointer in range and success whenever a pipeline can deliver
    #[test]
    fn sticky_pointer_stays_in_range(
        failures in prop::collection::vec(0usize..=6, 1..=6),
        messages in 1usize..=20,
    ) {
        let backends: Vec<_> = failures
            .iter()
            .enumerate()
            .map(|(i, &n)| FlakyBackend::failing_first(&format!("p{i}"), n))
            .collect();
        let pipelines = backends
            .iter()
            .map(|b| DeliveryPipeline::from_shared(Arc::clone(b) as Arc<dyn mailrelay::Backend>))
            .collect();
        let mut failover = StickyFailover::new(pipelines).unwrap();

        for i in 0..messages {
            prop_assert_eq!(failover.send(&message(i)), Ok(true));
            prop_assert!(failover.current_index() < failures.len());
            prop_assert_eq!(failover.sweeps(), 0);
        }
    }

    /// Property: the sweep budget bounds the attempts on a hopeless message
    #[test]
    fn sweep_budget_bounds_attempts(
        pipelines in 1usize..=5,
        max_sweeps in 0usize..=5,
    ) {
        let backends: Vec<_> = (0..pipelines)
            .map(|i| FlakyBackend::broken(&format!("p{i}")))
            .collect();
        let mut failover = StickyFailover::new(
            backends
                .iter()
                .map(|b| DeliveryPipeline::from_shared(Arc::clone(b) as Arc<dyn mailrelay::Backend>))
                .collect(),
        )
        .unwrap()
        .with_max_sweeps(max_sweeps);

        let err = failover.send(&message(0)).unwrap_err();
        prop_assert!(err.is_max_sweeps());

        let attempts: usize = backends.iter().map(|b| b.calls()).sum();
        prop_assert_eq!(attempts, pipelines * (max_sweeps + 1));
        prop_assert_eq!(failover.current_index(), 0);

        prop_assert!(failover.send(&message(1)).is_err());
        let attempts_after: usize = backends.iter().map(|b| b.calls()).sum();
        prop_assert_eq!(attempts_after, attempts + 1);
    }

    /// Property: stateless failover delivers iff some pipeline is healthy
    #[test]
    fn stateless_delivers_iff_any_healthy(healthy in prop::collection::vec(any::<bool>(), 1..=6)) {
        let pipelines = healthy
            .iter()
            .enumerate()
            .map(|(i, &ok)| {
                let backend = if ok {
                    FlakyBackend::healthy(&format!("p{i}"))
                } else {
                    FlakyBackend::broken(&format!("p{i}"))
                };
                DeliveryPipeline::from_shared(backend)
            })
            .collect();
        let mut failover = StatelessFailover::new(pipelines).unwrap();

        prop_assert_eq!(failover.send(&message(0)), healthy.iter().any(|&ok| ok));
    }
}
