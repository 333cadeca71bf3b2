use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed-interval retry: up to `max_attempts` tries, each preceded by an `interval_ms` pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval_ms: u64) -> Self {
        Self {
            max_attempts,
            interval_ms,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval_ms: 5_000,
        }
    }
}
