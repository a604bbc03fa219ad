//! opensky-client: async transport for the OpenSky historical REST API.
//!
//! Builds requests from `opensky_core::Query`, attaches basic auth, and
//! hands response bodies to the core decoders. No retries, no caching.

pub mod client;

pub use client::{ClientConfig, ClientError, OpenSkyClient};
