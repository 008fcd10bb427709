use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall clock as epoch milliseconds, the unit every store timestamp
/// uses.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
