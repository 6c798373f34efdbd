use chrono::Utc;

/// RFC 3339 timestamp with millisecond precision, as stamped into workflow metadata.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Compact local timestamp used for fallback file names.
pub fn stamp_now() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
