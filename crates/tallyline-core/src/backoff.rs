//! Reconnect backoff schedule.

use std::time::Duration;

/// Base delay for attempt 0.
pub const BACKOFF_FLOOR: Duration = Duration::from_millis(1000);

/// Cap for the exponential component.
pub const BACKOFF_CEILING: Duration = Duration::from_millis(30_000);

/// Exclusive upper bound of the random jitter, in milliseconds.
pub const BACKOFF_JITTER_MS: u64 = 1000;

/// Delay before reconnect attempt `attempt` (0-indexed).
///
/// `min(1000ms * 2^attempt, 30000ms)` plus a jitter in `[0, 1000ms)` drawn
/// from `jitter_entropy` (any random `u64`; reduced internally so callers
/// can pass raw entropy).
#[must_use]
pub fn reconnect_delay(attempt: u32, jitter_entropy: u64) -> Duration {
    // 2^5 already exceeds the ceiling; clamp the shift so it cannot overflow.
    let base = 1000u64 << attempt.min(5);
    let base = base.min(BACKOFF_CEILING.as_millis() as u64);
    Duration::from_millis(base + jitter_entropy % BACKOFF_JITTER_MS)
}
