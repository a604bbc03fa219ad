//! Shared types, error enum, and decoded record types for opensky-core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::callsign;
use crate::coerce::{self, epoch_to_datetime};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A JSON value that could not be read as a number.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("couldn't parse {value} as number")]
pub struct TypeMismatch {
    pub value: Value,
}

/// Why a single waypoint row was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WaypointFault {
    #[error("row contains {actual} values, expected at least {expected}")]
    Arity { expected: usize, actual: usize },
    #[error("invalid time_position value: {0}")]
    TimePosition(#[source] TypeMismatch),
    #[error("invalid on_ground value: {value}")]
    OnGround { value: Value },
    #[error("expected an array, got {value}")]
    NotAnArray { value: Value },
}

/// All errors produced by opensky-core.
#[derive(Debug, Error)]
pub enum OpenSkyError {
    #[error("invalid waypoint object at position {index}: {fault}")]
    InvalidWaypoint { index: usize, fault: WaypointFault },
    #[error("{field} value {value} is outside the representable time range")]
    TimestampOutOfRange { field: &'static str, value: f64 },
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, OpenSkyError>;

// ---------------------------------------------------------------------------
// Flights
// ---------------------------------------------------------------------------

/// A completed flight as returned by the `/flights/*` endpoints.
///
/// Field names on the wire are fixed by the upstream API. Null or missing
/// ids, times and counts read as empty or zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    #[serde(default, deserialize_with = "coerce::null_as_default")]
    pub icao24: String,
    #[serde(
        rename = "firstSeen",
        default,
        deserialize_with = "coerce::null_as_default"
    )]
    pub first_seen: i64,
    #[serde(rename = "estDepartureAirport", default)]
    pub est_departure_airport: Option<String>,
    #[serde(
        rename = "lastSeen",
        default,
        deserialize_with = "coerce::null_as_default"
    )]
    pub last_seen: i64,
    #[serde(rename = "estArrivalAirport", default)]
    pub est_arrival_airport: Option<String>,
    #[serde(default, deserialize_with = "callsign::deserialize_option")]
    pub callsign: Option<String>,
    #[serde(rename = "estDepartureAirportHorizDistance", default)]
    pub est_departure_airport_horiz_distance: Option<i64>,
    #[serde(rename = "estDepartureAirportVertDistance", default)]
    pub est_departure_airport_vert_distance: Option<i64>,
    #[serde(rename = "estArrivalAirportHorizDistance", default)]
    pub est_arrival_airport_horiz_distance: Option<i64>,
    #[serde(rename = "estArrivalAirportVertDistance", default)]
    pub est_arrival_airport_vert_distance: Option<i64>,
    /// Number of airports that matched the departure heuristic.
    #[serde(
        rename = "departureAirportCandidatesCount",
        default,
        deserialize_with = "coerce::null_as_default"
    )]
    pub departure_airport_candidates_count: i64,
    #[serde(
        rename = "arrivalAirportCandidatesCount",
        default,
        deserialize_with = "coerce::null_as_default"
    )]
    pub arrival_airport_candidates_count: i64,
}

impl Flight {
    /// `firstSeen` as an absolute time.
    pub fn first_seen_time(&self) -> Option<DateTime<Utc>> {
        epoch_to_datetime(self.first_seen)
    }

    /// `lastSeen` as an absolute time.
    pub fn last_seen_time(&self) -> Option<DateTime<Utc>> {
        epoch_to_datetime(self.last_seen)
    }
}

// ---------------------------------------------------------------------------
// Tracks
// ---------------------------------------------------------------------------

/// Track payload exactly as received, before any row is validated.
///
/// `path` rows stay untyped JSON; `decode::assemble_track` turns them into
/// `Waypoint`s. A null or missing id reads as empty and a null or missing
/// start/end time as the epoch.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTrackResponse {
    #[serde(default, deserialize_with = "coerce::null_as_default")]
    pub icao24: String,
    #[serde(default, deserialize_with = "callsign::deserialize")]
    pub callsign: String,
    #[serde(
        rename = "startTime",
        default,
        deserialize_with = "coerce::null_as_default"
    )]
    pub start_time: f64,
    #[serde(
        rename = "endTime",
        default,
        deserialize_with = "coerce::null_as_default"
    )]
    pub end_time: f64,
    #[serde(default)]
    pub path: Option<Vec<Value>>,
}

/// One aircraft's trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackResponse {
    pub icao24: String,
    pub callsign: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Waypoints in the order the service delivered them.
    pub path: Vec<Waypoint>,
}

/// One trajectory sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    /// `None` when the row's time field was null.
    pub time: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Barometric altitude, meters.
    pub baro_altitude: Option<f64>,
    /// Decimal degrees clockwise from north.
    pub true_track: Option<f64>,
    pub on_ground: bool,
}

impl Waypoint {
    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

// ---------------------------------------------------------------------------
// Error bodies
// ---------------------------------------------------------------------------

/// Body the service attaches to non-200 responses.
///
/// Every field is optional; only `message` is surfaced to callers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    /// Epoch millis on some deployments, an ISO string on others.
    pub timestamp: Option<Value>,
    pub status: Option<u16>,
    pub error: Option<String>,
    pub exception: Option<String>,
    pub message: Option<String>,
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
