//! opensky-core: Pure decode library for the OpenSky historical API.
//!
//! No async, no HTTP. Turns flight and track response bodies into typed
//! records and describes the queries; `opensky-client` does the transport.

pub mod callsign;
pub mod coerce;
pub mod config;
pub mod decode;
pub mod query;
pub mod types;

// Re-export commonly used types at crate root
pub use decode::{assemble_track, decode_waypoint, parse_flights, parse_track_response};
pub use query::{Query, TimeWindow};
pub use types::*;
