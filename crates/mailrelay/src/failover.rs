//! Choosing which pipeline delivers a message.
//!
//! Two strategies are provided:
//!
//! - [`StatelessFailover`] tries every pipeline in order, starting from the
//!   first, on every message.
//! - [`StickyFailover`] remembers which pipeline last worked and starts
//!   there. When every pipeline keeps failing it gives up after a bounded
//!   number of full sweeps with [`FailoverError::MaxSweepsReached`].
//!
//! Both consume pipeline errors: a failed attempt is logged and the next
//! pipeline is tried. The caller learns only whether the message went out.

use crate::error::FailoverError;
use crate::pipeline::DeliveryPipeline;
use crate::Message;

/// Sweep budget used by [`StickyFailover::new`].
pub const DEFAULT_MAX_SWEEPS: usize = 10_000;

/// Delivers a message through one of several pipelines.
pub trait Failover: Send {
    /// Attempts delivery.
    ///
    /// Returns `Ok(true)` once some pipeline accepted the message and
    /// `Ok(false)` when none did.
    ///
    /// # Errors
    ///
    /// Returns [`FailoverError::MaxSweepsReached`] when a sticky failover
    /// exhausts its sweep budget.
    fn send(&mut self, message: &Message) -> Result<bool, FailoverError>;
}

impl<F: Failover + ?Sized> Failover for Box<F> {
    fn send(&mut self, message: &Message) -> Result<bool, FailoverError> {
        (**self).send(message)
    }
}

/// Tries pipelines in order until one succeeds.
///
/// Keeps nothing between messages beyond the state held by each pipeline's
/// behaviors.
#[derive(Debug)]
pub struct StatelessFailover {
    pipelines: Vec<DeliveryPipeline>,
}

impl StatelessFailover {
    /// # Errors
    ///
    /// Returns [`FailoverError::NoPipelines`] if `pipelines` is empty.
    pub fn new(pipelines: Vec<DeliveryPipeline>) -> Result<Self, FailoverError> {
        if pipelines.is_empty() {
            return Err(FailoverError::NoPipelines);
        }
        Ok(Self { pipelines })
    }

    pub fn pipelines(&self) -> &[DeliveryPipeline] {
        &self.pipelines
    }

    /// Returns `true` as soon as one pipeline delivers `message`, `false`
    /// if all of them fail.
    pub fn send(&mut self, message: &Message) -> bool {
        self.try_each(message)
    }

    fn try_each(&mut self, message: &Message) -> bool {
        let total = self.pipelines.len();
        for (index, pipeline) in self.pipelines.iter_mut().enumerate() {
            tracing::info!(
                backend = %pipeline.backend_name(),
                index,
                total,
                "attempting delivery"
            );
            match pipeline.attempt(message) {
                Ok(receipt) => {
                    tracing::info!(backend = %receipt.backend, %receipt, "email delivered");
                    return true;
                }
                Err(err) => {
                    tracing::warn!(backend = %pipeline.backend_name(), error = %err, "delivery failed, trying next backend");
                }
            }
        }

        tracing::error!(subject = %message.subject(), backends = total, "all backends failed");
        false
    }
}

impl Failover for StatelessFailover {
    fn send(&mut self, message: &Message) -> Result<bool, FailoverError> {
        Ok(self.try_each(message))
    }
}

/// Starts from the pipeline that last succeeded.
///
/// The pointer moves only on failure, wrapping back to the first pipeline
/// after the last. Each wrap completes a sweep. A single `send` keeps going
/// until a pipeline succeeds or the number of completed sweeps exceeds the
/// budget, so with `n` pipelines and a budget of `m` sweeps a hopeless
/// message costs at most `n × (m + 1)` attempts.
#[derive(Debug)]
pub struct StickyFailover {
    pipelines: Vec<DeliveryPipeline>,
    index: usize,
    sweeps: usize,
    max_sweeps: usize,
}

impl StickyFailover {
    /// Creates a failover with [`DEFAULT_MAX_SWEEPS`].
    ///
    /// # Errors
    ///
    /// Returns [`FailoverError::NoPipelines`] if `pipelines` is empty.
    pub fn new(pipelines: Vec<DeliveryPipeline>) -> Result<Self, FailoverError> {
        if pipelines.is_empty() {
            return Err(FailoverError::NoPipelines);
        }
        Ok(Self {
            pipelines,
            index: 0,
            sweeps: 0,
            max_sweeps: DEFAULT_MAX_SWEEPS,
        })
    }

    /// Sets how many full sweeps may complete before giving up.
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Index of the pipeline the next `send` starts from.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Sweeps completed without a success.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    pub fn max_sweeps(&self) -> usize {
        self.max_sweeps
    }

    pub fn pipelines(&self) -> &[DeliveryPipeline] {
        &self.pipelines
    }

    /// Delivers `message`, starting from the current pointer.
    ///
    /// # Errors
    ///
    /// Returns [`FailoverError::MaxSweepsReached`] once more than
    /// `max_sweeps` sweeps have completed without a success. The counter is
    /// only cleared by a delivery, so once exhausted every later send fails
    /// after a single failed attempt.
    pub fn send(&mut self, message: &Message) -> Result<bool, FailoverError> {
        let total = self.pipelines.len();
        loop {
            let Some(pipeline) = self.pipelines.get_mut(self.index) else {
                tracing::error!(index = self.index, total, "failover pointer out of range");
                return Ok(false);
            };

            tracing::info!(
                backend = %pipeline.backend_name(),
                index = self.index,
                sweeps = self.sweeps,
                "attempting delivery"
            );

            match pipeline.attempt(message) {
                Ok(receipt) => {
                    self.sweeps = 0;
                    tracing::info!(backend = %receipt.backend, %receipt, "email delivered");
                    return Ok(true);
                }
                Err(err) => {
                    tracing::warn!(
                        backend = %pipeline.backend_name(),
                        error = %err,
                        "delivery failed, trying next backend"
                    );

                    self.index = (self.index + 1) % total;
                    if self.index == 0 {
                        self.sweeps += 1;
                    }
                    // stays exhausted until some pipeline delivers again
                    if self.sweeps > self.max_sweeps {
                        tracing::error!(
                            subject = %message.subject(),
                            sweeps = self.sweeps,
                            max_sweeps = self.max_sweeps,
                            "sweep budget exhausted"
                        );
                        return Err(FailoverError::MaxSweepsReached {
                            sweeps: self.sweeps,
                        });
                    }
                }
            }
        }
    }
}

impl Failover for StickyFailover {
    fn send(&mut self, message: &Message) -> Result<bool, FailoverError> {
        StickyFailover::send(self, message)
    }
}
