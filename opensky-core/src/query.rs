//! Endpoint paths and query parameters for the historical API.
//!
//! Pure data; the client crate turns a `Query` into an HTTP request.
//! Unset bounds and empty identifiers are left out of the query string
//! entirely rather than sent as a sentinel.

use chrono::{DateTime, Utc};

/// Default API root.
pub const BASE_URL: &str = "https://opensky-network.org/api";

/// Optional `[begin, end]` bounds for flight queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        TimeWindow {
            begin: Some(begin),
            end: Some(end),
        }
    }

    /// No bounds; the service applies its own defaults.
    pub fn unbounded() -> Self {
        TimeWindow::default()
    }

    fn push_params(&self, params: &mut Vec<(&'static str, String)>) {
        if let Some(begin) = self.begin {
            params.push(("begin", begin.timestamp().to_string()));
        }
        if let Some(end) = self.end {
            params.push(("end", end.timestamp().to_string()));
        }
    }
}

/// One of the five read-only historical queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// All flights in the window.
    AllFlights { window: TimeWindow },
    /// Flights of a single aircraft.
    FlightsByAircraft { icao24: String, window: TimeWindow },
    /// Flights that arrived at an airport.
    Arrivals { airport: String, window: TimeWindow },
    /// Flights that departed from an airport.
    Departures { airport: String, window: TimeWindow },
    /// Trajectory of one aircraft nearest `time` (`None` asks for the live track).
    Track {
        icao24: String,
        time: Option<DateTime<Utc>>,
    },
}

impl Query {
    /// Path below the API root.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Query::AllFlights { .. } => "/flights/all",
            Query::FlightsByAircraft { .. } => "/flights/aircraft",
            Query::Arrivals { .. } => "/flights/arrival",
            Query::Departures { .. } => "/flights/departure",
            Query::Track { .. } => "/tracks/all",
        }
    }

    /// Query parameters, sorted by name.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        match self {
            Query::AllFlights { window } => window.push_params(&mut params),
            Query::FlightsByAircraft { icao24, window } => {
                window.push_params(&mut params);
                push_non_empty(&mut params, "icao24", icao24);
            }
            Query::Arrivals { airport, window } | Query::Departures { airport, window } => {
                window.push_params(&mut params);
                push_non_empty(&mut params, "airport", airport);
            }
            Query::Track { icao24, time } => {
                push_non_empty(&mut params, "icao24", icao24);
                if let Some(time) = time {
                    params.push(("time", time.timestamp().to_string()));
                }
            }
        }
        params.sort_by_key(|(name, _)| *name);
        params
    }
}

fn push_non_empty(params: &mut Vec<(&'static str, String)>, name: &'static str, value: &str) {
    if !value.is_empty() {
        params.push((name, value.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
