//! Timestamp utilities

use chrono::{DateTime, Local, NaiveDateTime};

/// Second-resolution timestamp format used in storage directory and file names
pub const PATH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Get current local timestamp
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Render a timestamp for use as a path segment (`2024-03-01_14-05-09`)
pub fn path_timestamp(at: &DateTime<Local>) -> String {
    at.format(PATH_TIMESTAMP_FORMAT).to_string()
}

/// Current time rendered as a path segment
pub fn path_timestamp_now() -> String {
    path_timestamp(&now())
}

/// Check whether a string is a well-formed path timestamp
pub fn is_path_timestamp(s: &str) -> bool {
    NaiveDateTime::parse_from_str(s, PATH_TIMESTAMP_FORMAT).is_ok()
}
