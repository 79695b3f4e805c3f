use std::time::Duration;

/// Bounded linear backoff for reads that may race replication lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay multiplied by the attempt number before the next attempt.
    pub backoff_step: Duration,
    /// Optional bound on the total time spent retrying.
    pub deadline: Option<Duration>,
}

impl Default for ReadRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(100),
            deadline: None,
        }
    }
}

impl ReadRetryPolicy {
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_step,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Delay to wait after the given (1-based) failed attempt, or `None` when
    /// the attempt bound or the deadline rules out another try.
    pub fn next_delay(&self, attempt: u32, elapsed: Duration) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let delay = self.backoff_step.saturating_mul(attempt);
        match self.deadline {
            Some(deadline) if elapsed.saturating_add(delay) > deadline => None,
            _ => Some(delay),
        }
    }
}
