//! Configuration file management for opensky.
//!
//! Reads/writes `~/.opensky/config.yaml` with API credentials, the API
//! root, and the request timeout.

use std::path::{Path, PathBuf};

use crate::query::BASE_URL;
use crate::types::OpenSkyError;

/// Requests that take longer than this are abandoned.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub api: ApiConfig,
}

/// Basic-auth credentials. Anonymous access when either is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            credentials: CredentialsConfig::default(),
            api: ApiConfig {
                base_url: BASE_URL.into(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
        }
    }
}

impl CredentialsConfig {
    /// True if both username and password are set.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Get the config directory path (`~/.opensky/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".opensky")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.opensky/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

/// Load config from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(_) => Config::default(),
    }
}

/// Save config to `~/.opensky/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, OpenSkyError> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save config to an explicit path, creating parent directories.
pub fn save_config_to(config: &Config, path: &Path) -> Result<(), OpenSkyError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| OpenSkyError::Config(e.to_string()))?;
    }
    std::fs::write(path, serialize_config(config))?;
    Ok(())
}

/// Parse simple YAML-like config text. Unknown keys are ignored.
fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }

        match (current_section.as_deref(), key) {
            (Some("credentials"), "username") => {
                config.credentials.username = parse_string_value(val).unwrap_or_default();
            }
            (Some("credentials"), "password") => {
                config.credentials.password = parse_string_value(val).unwrap_or_default();
            }
            (Some("api"), "base_url") => {
                if let Some(v) = parse_string_value(val) {
                    config.api.base_url = v;
                }
            }
            (Some("api"), "timeout_secs") => {
                if let Ok(v) = val.parse::<u64>() {
                    config.api.timeout_secs = v;
                }
            }
            _ => {}
        }
    }

    config
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

/// Serialize config to YAML-like text.
fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# opensky configuration".to_string(), String::new()];

    lines.push("credentials:".into());
    lines.push(format!("  username: \"{}\"", config.credentials.username));
    lines.push(format!("  password: \"{}\"", config.credentials.password));
    lines.push(String::new());

    lines.push("api:".into());
    lines.push(format!("  base_url: \"{}\"", config.api.base_url));
    lines.push(format!("  timeout_secs: {}", config.api.timeout_secs));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
