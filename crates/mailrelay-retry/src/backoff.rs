use std::time::Duration;

/// Computes how long to wait before the next attempt.
///
/// `delay` must be a pure function of `attempt`: the same attempt number
/// always yields the same duration.
pub trait Backoff: Send + Sync {
    /// Delay before retrying after `attempt` failed attempts (1 for the
    /// first retry).
    fn delay(&self, attempt: usize) -> Duration;
}

/// Same delay before every retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBackoff {
    delay: Duration,
}

impl ConstantBackoff {
    /// Creates a constant backoff.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for ConstantBackoff {
    /// Ten seconds.
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl Backoff for ConstantBackoff {
    fn delay(&self, _attempt: usize) -> Duration {
        self.delay
    }
}

/// `min(base × factor^attempt, max_delay)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    base: Duration,
    factor: f64,
    max_delay: Duration,
}

impl ExponentialBackoff {
    /// Creates an exponential backoff with a factor of 2 and a 60 second cap.
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Sets the growth factor.
    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Sets the cap.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }
}

impl Default for ExponentialBackoff {
    /// One second base, doubling, capped at 60 seconds.
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Backoff for ExponentialBackoff {
    fn delay(&self, attempt: usize) -> Duration {
        let exponent = attempt.min(i32::MAX as usize) as i32;
        let secs = self.base.as_secs_f64() * self.factor.powi(exponent);

        // Large exponents overflow to infinity; anything past the cap is the cap.
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Function-based backoff.
pub struct FnBackoff<F> {
    f: F,
}

impl<F> FnBackoff<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Backoff for FnBackoff<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: usize) -> Duration {
        (self.f)(attempt)
    }
}
