//! Decode OpenSky response bodies into typed records.
//!
//! Flights decode structurally; every field is named on the wire. Tracks
//! don't: each waypoint is a positional array mixing numbers, nulls, and a
//! boolean, so rows are pulled apart index by index:
//!
//! | idx | field          | rule                                   |
//! |-----|----------------|----------------------------------------|
//! | 0   | time           | null → unset, else must be a number    |
//! | 1   | latitude       | number → `Some`, anything else → `None` |
//! | 2   | longitude      | same                                   |
//! | 3   | baro_altitude  | same                                   |
//! | 4   | true_track     | same                                   |
//! | 5   | on_ground      | must be a boolean                      |
//! | 6+  | (any)          | ignored                                |
//!
//! One bad row rejects the whole track.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::coerce::{epoch_to_datetime, number_to_epoch_seconds, optional_f64};
use crate::types::*;

/// Minimum number of elements in a waypoint row.
pub const WAYPOINT_FIELDS: usize = 6;

fn invalid(index: usize, fault: WaypointFault) -> OpenSkyError {
    OpenSkyError::InvalidWaypoint { index, fault }
}

// ---------------------------------------------------------------------------
// Waypoints
// ---------------------------------------------------------------------------

/// Decode one positional waypoint row.
///
/// `index` is the row's position in the parent path and only shows up in
/// errors.
pub fn decode_waypoint(row: &[Value], index: usize) -> Result<Waypoint> {
    if row.len() < WAYPOINT_FIELDS {
        return Err(invalid(
            index,
            WaypointFault::Arity {
                expected: WAYPOINT_FIELDS,
                actual: row.len(),
            },
        ));
    }

    let time = match &row[0] {
        Value::Null => None,
        raw => {
            let seconds = number_to_epoch_seconds(raw)
                .map_err(|e| invalid(index, WaypointFault::TimePosition(e)))?;
            let time = epoch_to_datetime(seconds).ok_or_else(|| {
                invalid(
                    index,
                    WaypointFault::TimePosition(TypeMismatch { value: raw.clone() }),
                )
            })?;
            Some(time)
        }
    };

    let on_ground = row[5].as_bool().ok_or_else(|| {
        invalid(
            index,
            WaypointFault::OnGround {
                value: row[5].clone(),
            },
        )
    })?;

    Ok(Waypoint {
        time,
        latitude: optional_f64(&row[1]),
        longitude: optional_f64(&row[2]),
        baro_altitude: optional_f64(&row[3]),
        true_track: optional_f64(&row[4]),
        on_ground,
    })
}

// ---------------------------------------------------------------------------
// Track assembly
// ---------------------------------------------------------------------------

fn whole_seconds(field: &'static str, value: f64) -> Result<DateTime<Utc>> {
    epoch_to_datetime(value.trunc() as i64)
        .ok_or(OpenSkyError::TimestampOutOfRange { field, value })
}

/// Turn a raw track payload into a `TrackResponse`.
///
/// Rows are decoded in order and the first failure is returned as-is; rows
/// after it are never looked at and no partial track is produced.
pub fn assemble_track(raw: RawTrackResponse) -> Result<TrackResponse> {
    let start_time = whole_seconds("startTime", raw.start_time)?;
    let end_time = whole_seconds("endTime", raw.end_time)?;

    let path = raw
        .path
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, row)| match row {
            Value::Array(fields) => decode_waypoint(fields, index),
            other => Err(invalid(
                index,
                WaypointFault::NotAnArray {
                    value: other.clone(),
                },
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TrackResponse {
        icao24: raw.icao24,
        callsign: raw.callsign,
        start_time,
        end_time,
        path,
    })
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Decode a `/tracks/*` body and assemble it.
pub fn parse_track_response(body: &[u8]) -> Result<TrackResponse> {
    let raw: RawTrackResponse = serde_json::from_slice(body)?;
    assemble_track(raw)
}

/// Decode a `/flights/*` body.
pub fn parse_flights(body: &[u8]) -> Result<Vec<Flight>> {
    Ok(serde_json::from_slice(body)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
