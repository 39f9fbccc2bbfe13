//! Lenient timestamp decoding for server payloads.
//!
//! The service emits RFC 3339 timestamps, but records written by older
//! server builds carry naive UTC timestamps without an offset. Both decode to
//! `DateTime<Utc>`; encoding always produces RFC 3339.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error as _};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parses an RFC 3339 or offset-less ISO 8601 timestamp as UTC.
pub(crate) fn parse(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, NAIVE_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Deserializes a required timestamp.
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Deserializes an optional timestamp; `null` and a missing field map to
/// `None`.
pub(crate) fn deserialize_option<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|value| {
        parse(&value).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {value}")))
    })
    .transpose()
}
