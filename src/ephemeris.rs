//! Ephemeris API client for per-day solar data.
//!
//! One request per (coordinate, date) against the sunrise-sunset.org wire
//! contract: `lat`, `lng`, `date=YYYY-MM-DD`, and `formatted=0` so the
//! response carries ISO-8601 timestamps instead of human-readable strings.
//! The JSON envelope is `{ "status": ..., "results": { ... } }` and only the
//! literal status `"OK"` counts as success.
//!
//! Decoding is split from transport: [`decode_day_record`] is a pure function
//! over the response body, so the envelope handling is testable without a
//! socket, and [`SunriseSunsetClient`] only adds the HTTP plumbing around it.
//!
//! Required fields (`sunrise`, `sunset`) fail the whole fetch when they do
//! not parse. The civil twilight fields are optional upstream — the provider
//! omits them in some polar cases — so absence or a parse failure there
//! degrades the field to "not available" instead of failing the fetch.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::Deserialize;
use std::future::Future;
use thiserror::Error;

use crate::constants::EPHEMERIS_API_URL;
use crate::timestamp::{self, MalformedTimestamp};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are inside the valid geographic ranges.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// One day's solar data at a location. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub day_length_seconds: u32,
    /// Absent in some polar cases; absence propagates, never a sentinel time.
    pub civil_twilight_begin: Option<DateTime<Utc>>,
    pub civil_twilight_end: Option<DateTime<Utc>>,
}

impl DayRecord {
    /// Day length in whole minutes.
    pub fn day_length_minutes(&self) -> i64 {
        i64::from(self.day_length_seconds) / 60
    }

    /// Minute-of-day of sunrise, as carried on the instant (hour*60 + minute).
    pub fn sunrise_minute_of_day(&self) -> i64 {
        minute_of_day(self.sunrise)
    }

    /// Minute-of-day of sunset, as carried on the instant.
    pub fn sunset_minute_of_day(&self) -> i64 {
        minute_of_day(self.sunset)
    }
}

fn minute_of_day(instant: DateTime<Utc>) -> i64 {
    i64::from(instant.hour()) * 60 + i64::from(instant.minute())
}

/// Failure taxonomy for a single ephemeris fetch.
#[derive(Debug, Error)]
pub enum EphemerisError {
    /// The request URL could not be built. Should not occur with validated
    /// numeric coordinates.
    #[error("could not build ephemeris request: {0}")]
    InvalidRequest(String),
    /// Network or IO failure talking to the provider.
    #[error("network error reaching ephemeris API")]
    Transport(#[source] reqwest::Error),
    /// The body was not decodable JSON or lacked the required envelope fields.
    #[error("ephemeris API returned an undecodable response")]
    InvalidResponse,
    /// The provider reported a non-OK status (e.g. invalid date or
    /// out-of-range coordinate).
    #[error("ephemeris API reported status `{0}`")]
    ApiStatus(String),
    /// A required timestamp field failed to parse.
    #[error(transparent)]
    MalformedTimestamp(#[from] MalformedTimestamp),
}

/// Source of per-day solar records.
///
/// The orchestrator is generic over this trait so tests can substitute a
/// canned provider for the HTTP client.
pub trait EphemerisProvider: Send + Sync {
    /// Fetch the solar record for one calendar day at one coordinate.
    fn day_record(
        &self,
        coordinate: Coordinate,
        date: NaiveDate,
    ) -> impl Future<Output = Result<DayRecord, EphemerisError>> + Send;
}

/// HTTP client for the sunrise-sunset.org ephemeris API.
#[derive(Debug, Clone)]
pub struct SunriseSunsetClient {
    http: reqwest::Client,
    base_url: String,
}

impl SunriseSunsetClient {
    pub fn new() -> Self {
        Self::with_base_url(EPHEMERIS_API_URL)
    }

    /// Client pointed at an alternate endpoint (local stub servers in tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn request_url(&self, coordinate: Coordinate, date: NaiveDate) -> Result<reqwest::Url, EphemerisError> {
        reqwest::Url::parse_with_params(
            &self.base_url,
            &[
                ("lat", coordinate.latitude.to_string()),
                ("lng", coordinate.longitude.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
                ("formatted", "0".to_string()),
            ],
        )
        .map_err(|e| EphemerisError::InvalidRequest(e.to_string()))
    }
}

impl Default for SunriseSunsetClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemerisProvider for SunriseSunsetClient {
    fn day_record(
        &self,
        coordinate: Coordinate,
        date: NaiveDate,
    ) -> impl Future<Output = Result<DayRecord, EphemerisError>> + Send {
        async move {
            let url = self.request_url(coordinate, date)?;
            let response = self
                .http
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(EphemerisError::Transport)?;
            let body = response.text().await.map_err(EphemerisError::Transport)?;
            decode_day_record(&body)
        }
    }
}

/// JSON envelope wrapping every API response.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    results: Option<RawDayRecord>,
}

/// The `results` object as it appears on the wire.
#[derive(Debug, Deserialize)]
struct RawDayRecord {
    sunrise: String,
    sunset: String,
    day_length: u32,
    #[serde(default)]
    civil_twilight_begin: Option<String>,
    #[serde(default)]
    civil_twilight_end: Option<String>,
}

/// Decode a raw response body into a [`DayRecord`].
///
/// Pure over the body string. Non-OK status maps to
/// [`EphemerisError::ApiStatus`]; undecodable JSON or a missing `results`
/// object maps to [`EphemerisError::InvalidResponse`]. Twilight fields are
/// decoded permissively.
pub fn decode_day_record(body: &str) -> Result<DayRecord, EphemerisError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|_| EphemerisError::InvalidResponse)?;

    if envelope.status != "OK" {
        return Err(EphemerisError::ApiStatus(envelope.status));
    }

    let raw = envelope.results.ok_or(EphemerisError::InvalidResponse)?;

    Ok(DayRecord {
        sunrise: timestamp::parse(&raw.sunrise)?,
        sunset: timestamp::parse(&raw.sunset)?,
        day_length_seconds: raw.day_length,
        civil_twilight_begin: parse_optional(raw.civil_twilight_begin.as_deref()),
        civil_twilight_end: parse_optional(raw.civil_twilight_end.as_deref()),
    })
}

/// Optional-field decode: absence or a parse failure clears the field.
fn parse_optional(s: Option<&str>) -> Option<DateTime<Utc>> {
    s.and_then(|s| timestamp::parse(s).ok())
}
