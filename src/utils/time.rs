use chrono::Utc;

/// Current wall clock time in milliseconds since the unix epoch.
pub fn time_millis() -> i64 {
    Utc::now().timestamp_millis()
}
