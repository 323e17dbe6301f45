//! Reconnection backoff policy.
//!
//! A pure, deterministic mapping from consecutive-failure count to retry
//! delay, with a hard ceiling on how many retries run before the
//! connection is declared terminally failed. The async scheduling lives in
//! `agrolink-client`; this module is sync-only math.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
/// Default maximum delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Default retry ceiling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Capped exponential backoff parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackoffPolicy {
    /// Base delay for the first retry in ms (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between retries in ms (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Consecutive failures tolerated before giving up (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the retry following `attempts` consecutive failures.
    ///
    /// Formula: `min(base_delay * 2^attempts, max_delay)`. Deterministic,
    /// non-decreasing in `attempts`, never exceeds `max_delay_ms`. The
    /// shift saturates so very high counts cannot overflow.
    #[must_use]
    pub fn delay(&self, attempts: u32) -> Duration {
        let exponential = self.base_delay_ms.saturating_mul(1u64 << attempts.min(31));
        Duration::from_millis(exponential.min(self.max_delay_ms))
    }

    /// Whether `attempts` has reached the retry ceiling.
    #[must_use]
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}
