//! Callsign cleanup applied while deserializing.
//!
//! The service pads callsigns to 8 characters and some payloads arrive
//! double-encoded, so `" \"UAL123 \" "` has to come out as `UAL123`.
//! Use through `#[serde(deserialize_with = "callsign::deserialize")]`.

use serde::{Deserialize, Deserializer};

/// Trim whitespace, drop one layer of surrounding quotes, trim again.
pub fn normalize(raw: &str) -> String {
    trim_quotes(raw.trim()).trim().to_string()
}

fn trim_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

/// Deserialize a normalized callsign; null becomes an empty string.
pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(normalize).unwrap_or_default())
}

/// Deserialize a normalized callsign, keeping null as `None`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(normalize))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
