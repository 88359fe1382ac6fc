//! services/portal/src/config.rs
//!
//! Defines the portal's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SESSION_DIR_NAME: &str = "support-portal";
const SESSION_FILE_NAME: &str = "session.json";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base path of the complaint and auth REST API, without a trailing slash.
    pub api_base_url: String,
    /// Where the signed-in identity is persisted between runs.
    pub session_file: PathBuf,
    /// Per-request timeout. Generous because suggestion requests run inference.
    pub request_timeout: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_base_url = std::env::var("PORTAL_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_base_url = normalize_base_url(&api_base_url).ok_or_else(|| {
            ConfigError::InvalidValue(
                "PORTAL_API_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            )
        })?;

        let session_file = match std::env::var("PORTAL_SESSION_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_session_file()
                .ok_or_else(|| ConfigError::MissingVar("PORTAL_SESSION_FILE".to_string()))?,
        };

        let request_timeout = match std::env::var("PORTAL_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "PORTAL_REQUEST_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a positive number of seconds", raw),
                    )
                })?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_base_url,
            session_file,
            request_timeout,
            log_level,
        })
    }
}

/// The platform's local data directory, e.g. `~/.local/share/support-portal/session.json`.
fn default_session_file() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(SESSION_DIR_NAME).join(SESSION_FILE_NAME))
}

fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    has_host.then(|| trimmed.to_string())
}
