use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix timestamp in milliseconds.
pub fn unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Current Unix timestamp in whole seconds.
pub fn unix_timestamp_s() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Milliseconds elapsed since `start_ms`, clamped to zero for future stamps.
pub fn elapsed_ms(start_ms: u64) -> u64 {
    unix_timestamp_ms().saturating_sub(start_ms)
}
