//! Session configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! Consumed by the CLI when wiring the transport, credential store and
//! session controller. Library callers may also build `SessionConfig`
//! directly.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_LOGIN_PATH: &str = "login.html";
pub const DEFAULT_DASHBOARD_PATH: &str = "dashboard.html";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} (expected whole seconds)")]
    InvalidSeconds { var: &'static str, value: String },
}

/// HTTP timeouts. `None` leaves the HTTP client default in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Option<Duration>,
    pub connect: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub api_base: String,
    pub timeouts: Timeouts,
    /// Lifetime of a saved token. `None` keeps sessions until logout or a 401.
    pub session_ttl: Option<Duration>,
    pub login_path: String,
    pub dashboard_path: String,
    pub storage_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            timeouts: Timeouts::default(),
            session_ttl: None,
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            dashboard_path: DEFAULT_DASHBOARD_PATH.to_owned(),
            storage_path: None,
        }
    }
}

impl SessionConfig {
    /// Build typed session config from environment variables.
    ///
    /// Optional:
    /// - `PROFITWAVY_API_BASE`: default `http://127.0.0.1:3000/api`
    /// - `PROFITWAVY_REQUEST_TIMEOUT_SECS`: HTTP client default when absent
    /// - `PROFITWAVY_CONNECT_TIMEOUT_SECS`: HTTP client default when absent
    /// - `PROFITWAVY_SESSION_TTL_SECS`: indefinite when absent
    /// - `PROFITWAVY_LOGIN_PATH`: default `login.html`
    /// - `PROFITWAVY_DASHBOARD_PATH`: default `dashboard.html`
    /// - `PROFITWAVY_STORAGE_PATH`: session file; the CLI picks a per-user
    ///   default when absent
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSeconds`] when a duration variable is set
    /// but is not a non-negative integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base = std::env::var("PROFITWAVY_API_BASE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| DEFAULT_API_BASE.to_owned(), |v| normalize_base(&v));

        let timeouts = Timeouts {
            request: env_secs("PROFITWAVY_REQUEST_TIMEOUT_SECS")?,
            connect: env_secs("PROFITWAVY_CONNECT_TIMEOUT_SECS")?,
        };
        let session_ttl = env_secs("PROFITWAVY_SESSION_TTL_SECS")?;

        let login_path = std::env::var("PROFITWAVY_LOGIN_PATH").unwrap_or_else(|_| DEFAULT_LOGIN_PATH.to_owned());
        let dashboard_path =
            std::env::var("PROFITWAVY_DASHBOARD_PATH").unwrap_or_else(|_| DEFAULT_DASHBOARD_PATH.to_owned());
        let storage_path = std::env::var_os("PROFITWAVY_STORAGE_PATH").map(PathBuf::from);

        Ok(Self { api_base, timeouts, session_ttl, login_path, dashboard_path, storage_path })
    }
}

pub(crate) fn normalize_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_secs(var: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|_| ConfigError::InvalidSeconds { var, value: raw.clone() })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
