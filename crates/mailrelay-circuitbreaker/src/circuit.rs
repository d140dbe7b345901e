use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::fmt;
use std::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CircuitState {
    /// Calls pass through and failures are counted.
    Closed,
    /// Calls are rejected until the reset timeout elapses.
    Open,
    /// Calls are let through as probes; the next success closes the circuit.
    HalfOpen,
}

impl CircuitState {
    /// Upper-case label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF-OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable breaker state. The config is passed in on every call so the
/// state itself stays plain data.
#[derive(Debug)]
pub(crate) struct Circuit {
    state: CircuitState,
    failure_count: usize,
    last_failure: Option<Instant>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure: None,
        }
    }
}

impl Circuit {
    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn failure_count(&self) -> usize {
        self.failure_count
    }

    pub(crate) fn last_failure(&self) -> Option<Instant> {
        self.last_failure
    }

    /// Pre-check. An open circuit whose reset timeout has elapsed since the
    /// last failure moves to half-open here and lets the call through.
    pub(crate) fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> bool {
        let now = config.clock.now();

        if self.state == CircuitState::Open {
            let cooled_down = match self.last_failure {
                Some(at) => now.saturating_duration_since(at) >= config.reset_timeout,
                None => true,
            };
            if !cooled_down {
                config
                    .event_listeners
                    .emit(&CircuitBreakerEvent::CallRejected {
                        pattern_name: config.name.clone(),
                        timestamp: now,
                    });

                #[cfg(feature = "tracing")]
                tracing::debug!(breaker = %config.name, "circuit open, call rejected");

                #[cfg(feature = "metrics")]
                counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "rejected").increment(1);

                return false;
            }
            self.transition_to(CircuitState::HalfOpen, config, now);
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::CallPermitted {
                pattern_name: config.name.clone(),
                timestamp: now,
                state: self.state,
            });
        true
    }

    pub(crate) fn record_success(&mut self, config: &CircuitBreakerConfig) {
        let now = config.clock.now();

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                pattern_name: config.name.clone(),
                timestamp: now,
                state: self.state,
            });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "success").increment(1);

        // A success while closed leaves the count alone; only a probe
        // success clears it.
        if self.state == CircuitState::HalfOpen {
            self.failure_count = 0;
            self.transition_to(CircuitState::Closed, config, now);
        }
    }

    pub(crate) fn record_failure(&mut self, config: &CircuitBreakerConfig) {
        let now = config.clock.now();
        self.failure_count += 1;
        self.last_failure = Some(now);

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                pattern_name: config.name.clone(),
                timestamp: now,
                state: self.state,
                failure_count: self.failure_count,
            });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "failure").increment(1);

        if self.failure_count >= config.failure_threshold {
            self.transition_to(CircuitState::Open, config, now);
        }
    }

    pub(crate) fn reset(&mut self, config: &CircuitBreakerConfig) {
        self.failure_count = 0;
        self.last_failure = None;
        let now = config.clock.now();
        self.transition_to(CircuitState::Closed, config, now);
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig, now: Instant) {
        if self.state == state {
            return;
        }

        let from_state = self.state;
        self.state = state;

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                pattern_name: config.name.clone(),
                timestamp: now,
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(
            breaker = %config.name,
            from = %from_state,
            to = %state,
            failures = self.failure_count,
            "circuit state transition"
        );

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => config.name.clone(),
                "from" => from_state.as_str(),
                "to" => state.as_str()
            )
            .increment(1);

            gauge!("circuitbreaker_state", "circuitbreaker" => config.name.clone())
                .set(match state {
                    CircuitState::Closed => 0.0,
                    CircuitState::Open => 1.0,
                    CircuitState::HalfOpen => 2.0,
                });
        }
    }
}
