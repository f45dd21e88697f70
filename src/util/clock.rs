//! Wall-clock helpers.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis()
}

/// Time left until `started_at_ms + timeout`, saturating at zero.
pub fn remaining(started_at_ms: u128, timeout: Duration, now_ms: u128) -> Duration {
    let deadline = started_at_ms.saturating_add(timeout.as_millis());
    let left = deadline.saturating_sub(now_ms);
    Duration::from_millis(u64::try_from(left).unwrap_or(u64::MAX))
}
