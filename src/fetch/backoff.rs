use std::time::Duration;

/// Explicit retry/backoff state machine
///
/// One `Backoff` value tracks a single target's retry budget. After each
/// failed attempt the fetch loop asks for the next delay; `None` means the
/// budget is exhausted and the last failure is terminal. Delays grow as
/// `base * 2^n` and are capped.
#[derive(Debug)]
pub struct Backoff {
    failures: u32,
    max_attempts: u32,
    base: Duration,
    cap: Duration,
}

impl Backoff {
    pub fn new(max_attempts: u32, base: Duration, cap: Duration) -> Self {
        Self {
            failures: 0,
            max_attempts,
            base,
            cap,
        }
    }

    /// Records a failed attempt and returns the delay before the next one,
    /// or `None` when all attempts are spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.failures += 1;
        if self.failures >= self.max_attempts {
            return None;
        }

        let factor = 2u32.saturating_pow(self.failures - 1);
        Some(self.base.saturating_mul(factor).min(self.cap))
    }

    /// Number of failed attempts recorded so far
    pub fn failures(&self) -> u32 {
        self.failures
    }
}
