// Module name shadows the `serde` crate — use `::serde` for the external crate.
use ::serde::Serializer;
use chrono::{DateTime, Utc};

/// Timestamp format used in API responses (`2024-05-01 13:45:09`).
pub const OUTPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serialize `DateTime<Utc>` in the API output format.
pub fn to_output_time<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.format(OUTPUT_TIME_FORMAT).to_string())
}
