//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Delay schedule: `base * 2^(attempt-1)`, capped at `max`, plus up to 10%
/// jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Delay to wait after the given 1-based attempt. Attempt 0 waits nothing.
    pub fn delay(&self, attempt: u32) -> Duration {
        let capped = self.capped_ms(attempt);

        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped + jitter)
    }

    fn capped_ms(&self, attempt: u32) -> u64 {
        if attempt == 0 {
            return 0;
        }
        let factor = 2u64.saturating_pow(attempt - 1);
        self.base_ms.saturating_mul(factor).min(self.max_ms)
    }
}
