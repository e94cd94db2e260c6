//! Jittered exponential backoff between apply attempts.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Delay before the next attempt after `attempt` failed ones.
///
/// The ceiling doubles per failure from `base_delay_ms` up to `max_delay_ms`.
/// Half of it is always waited, the other half is drawn at random so that
/// sidecars sharing a load balancer do not retry in lockstep.
pub fn apply_backoff(attempt: u32, retries: &RetryConfig) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let ceiling = retries
        .base_delay_ms
        .saturating_mul(1u64 << (attempt - 1).min(32))
        .min(retries.max_delay_ms);

    let floor = ceiling / 2;
    let spread = ceiling - floor;
    let jitter = if spread > 0 {
        rand::thread_rng().gen_range(0..=spread)
    } else {
        0
    };

    Duration::from_millis(floor + jitter)
}
