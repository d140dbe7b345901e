use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding log of accepted-call timestamps.
#[derive(Debug)]
pub(crate) struct SlidingLog {
    max_calls: usize,
    window: Duration,
    accepted: VecDeque<Instant>,
}

impl SlidingLog {
    pub(crate) fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            accepted: VecDeque::new(),
        }
    }

    /// Evicts expired entries, then records `now` if there is room.
    ///
    /// Returns the number of calls in the window after recording, or the
    /// time until the oldest entry expires when the window is full.
    pub(crate) fn try_acquire(&mut self, now: Instant) -> Result<usize, Duration> {
        self.evict(now);

        if self.accepted.len() < self.max_calls {
            self.accepted.push_back(now);
            return Ok(self.accepted.len());
        }

        let retry_after = self
            .accepted
            .front()
            .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
            .unwrap_or(self.window);
        Err(retry_after)
    }

    /// Entries whose age is at least the window are gone.
    fn evict(&mut self, now: Instant) {
        while let Some(oldest) = self.accepted.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                self.accepted.pop_front();
            } else {
                break;
            }
        }
    }

    pub(crate) fn in_window(&mut self, now: Instant) -> usize {
        self.evict(now);
        self.accepted.len()
    }

    pub(crate) fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub(crate) fn window(&self) -> Duration {
        self.window
    }
}
