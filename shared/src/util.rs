/// Current UTC timestamp (milliseconds)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a new resource id (UUID v4, hyphenated)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Truncate a Unix millis timestamp to the start of its UTC day.
///
/// The ERP stores order dates without a time component, so every date we
/// send is normalised to 00:00:00.
pub fn day_start(millis: i64) -> chrono::NaiveDateTime {
    let dt = chrono::DateTime::from_timestamp_millis(millis).unwrap_or_else(chrono::Utc::now);
    dt.date_naive().and_time(chrono::NaiveTime::MIN)
}
