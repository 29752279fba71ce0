//! Decorrelated-jitter backoff.
//!
//! `sleep = min(max, random_between(base, max(previous, base) * 3))`

use crate::config::ConfigError;
use rand::Rng;
use std::time::Duration;

/// Immutable backoff bounds. Only constructible with `0 < base <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            max: Duration::from_millis(5000),
        }
    }
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Result<Self, ConfigError> {
        if base.is_zero() {
            return Err(ConfigError::ZeroBaseSleep);
        }
        if max < base {
            return Err(ConfigError::MaxBelowBase { base, max });
        }
        Ok(Self { base, max })
    }

    /// Convenience for millisecond-granularity settings.
    pub fn from_millis(base_ms: u64, max_ms: u64) -> Result<Self, ConfigError> {
        Self::new(Duration::from_millis(base_ms), Duration::from_millis(max_ms))
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Next wait given the previous one. Pass `Duration::ZERO` to start a sequence.
    ///
    /// Always returns a value in `[base, max]`.
    pub fn next(&self, previous: Duration) -> Duration {
        let previous = previous.max(self.base);
        let upper = previous.saturating_mul(3);
        // upper > base because base > 0, so the range is never empty.
        let sleep = rand::thread_rng().gen_range(self.base..upper);
        sleep.min(self.max)
    }
}
