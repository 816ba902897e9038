use std::time::Duration;

/// Longest wait between two retry attempts, whatever the curve.
const MAX_WAIT: Duration = Duration::from_secs(30);

/// Exponential backoff schedule: attempt `n` (1-indexed) waits
/// `base * 2^(n-1)`, capped at a maximum wait.
///
/// The same curve serves both retry levels; only the base differs. With a
/// base of one second the waits are 1s, 2s, 4s, 8s, 16s, then the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// The curve used for blocked-destination retries.
    pub fn seconds() -> Self {
        Self::new(Duration::from_secs(1), MAX_WAIT)
    }

    /// The fine-grained curve used for transport retries.
    pub fn milliseconds() -> Self {
        Self::new(Duration::from_millis(1), MAX_WAIT)
    }

    /// Wait before retry attempt `attempt` (1-indexed).
    pub fn wait_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << exponent).min(self.max)
    }
}
