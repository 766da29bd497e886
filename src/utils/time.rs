use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
///
/// A clock set before 1970 reads as 0, which the validator then rejects as an
/// invalid timestamp instead of this layer panicking.
pub fn current_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Whether `timestamp_ms` is more than `max_age_ms` in the past relative to `now_ms`
pub fn is_older_than(timestamp_ms: u64, max_age_ms: u64, now_ms: u64) -> bool {
    now_ms.saturating_sub(timestamp_ms) > max_age_ms
}

/// Render `value` in lowercase base 36
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return String::from("0");
    }
    let mut out = Vec::with_capacity(13);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}
