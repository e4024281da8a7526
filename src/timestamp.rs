//! Timestamp parsing for ephemeris API responses.
//!
//! The API returns ISO-8601 combined date-times with a UTC offset, sometimes
//! carrying fractional seconds and sometimes not. Both variants are accepted
//! here; anything else is rejected. The parser never guesses a time zone:
//! the offset must be present in the string, and the result is normalized to
//! UTC. Conversion to local wall-clock time for display is the presentation
//! layer's job, not ours.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A timestamp string that matched neither accepted ISO-8601 variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed timestamp `{0}`")]
pub struct MalformedTimestamp(pub String);

/// Accepted format with fractional seconds, e.g. `2024-06-10T04:07:30.123+00:00`.
const FORMAT_FRACTIONAL: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// Accepted format without fractional seconds, e.g. `2024-06-10T04:07:30+00:00`.
const FORMAT_WHOLE_SECONDS: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Parse an ISO-8601 date-time with UTC offset into an absolute instant.
///
/// Tries the whole-seconds variant first (the common case for this API),
/// then the fractional variant. Fails with [`MalformedTimestamp`] if neither
/// matches. Pure; no side effects.
pub fn parse(s: &str) -> Result<DateTime<Utc>, MalformedTimestamp> {
    DateTime::parse_from_str(s, FORMAT_WHOLE_SECONDS)
        .or_else(|_| DateTime::parse_from_str(s, FORMAT_FRACTIONAL))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| MalformedTimestamp(s.to_string()))
}
