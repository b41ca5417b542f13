//! Runtime settings and per-user file locations.
//!
//! Credentials are stored at `~/.config/severino/ponto/config.json` and the
//! session cookies at `~/.config/severino/ponto/cookies.txt`. Both locations
//! and the portal address can be overridden from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application name used for the config directory path
const APP_NAME: &str = "severino";

/// Tool directory under the application directory
const TOOL_NAME: &str = "ponto";

/// Credentials file name
const CREDENTIALS_FILE: &str = "config.json";

/// Session cookie file name, sibling to the credentials file
const COOKIES_FILE: &str = "cookies.txt";

/// Base URL of the Facilita Ponto portal
pub const DEFAULT_PORTAL_URL: &str = "https://sistema.facilitaponto.com.br";

/// HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_CONFIG_DIR: &str = "SEVERINO_CONFIG_DIR";
pub const ENV_PORTAL_URL: &str = "SEVERINO_PORTAL_URL";
pub const ENV_TIMEOUT_SECS: &str = "SEVERINO_TIMEOUT_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("Invalid SEVERINO_TIMEOUT_SECS value: {0:?}")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub config_dir: PathBuf,
    pub portal_url: String,
    pub request_timeout: Duration,
}

impl Settings {
    /// Resolve settings from the environment, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_dir = match std::env::var_os(ENV_CONFIG_DIR) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => Self::default_config_dir()?,
        };

        let portal_url = std::env::var(ENV_PORTAL_URL)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PORTAL_URL.to_string());

        let request_timeout = match std::env::var(ENV_TIMEOUT_SECS) {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            config_dir,
            portal_url: normalize_base_url(&portal_url),
            request_timeout,
        })
    }

    /// Settings rooted at an explicit directory, with default portal values
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self {
            config_dir,
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_NAME).join(TOOL_NAME))
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.config_dir.join(CREDENTIALS_FILE)
    }

    pub fn cookies_path(&self) -> PathBuf {
        self.config_dir.join(COOKIES_FILE)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

// ============================================================================
// Tests
// ============================================================================
