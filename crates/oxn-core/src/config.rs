//! Dashboard configuration, read from the environment.

use std::time::Duration;

use tracing::debug;

use crate::dates::DisplayZone;
use crate::error::{OxnError, Result};

pub const ENV_BACKEND_URL: &str = "OXN_BACKEND_URL";
pub const ENV_START_PATH: &str = "OXN_START_PATH";
pub const ENV_TIMEZONE: &str = "OXN_TIMEZONE";
pub const ENV_ACCEPTED_EXTENSIONS: &str = "OXN_ACCEPTED_EXTENSIONS";
pub const ENV_REQUEST_TIMEOUT: &str = "OXN_REQUEST_TIMEOUT_SECS";

/// Path of the start endpoint. The backend has served both `/run` and
/// `/runsync`, so it is a template with an `{id}` placeholder.
pub const DEFAULT_START_PATH: &str = "/experiments/{id}/run";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Base URL of the OXN backend, e.g. `http://localhost:8000`.
    pub backend_url: String,
    pub start_path: String,
    pub display_zone: DisplayZone,
    /// File name suffixes the upload flow accepts (default: `.yaml`).
    pub accepted_extensions: Vec<String>,
    /// No timeout unless set.
    pub request_timeout: Option<Duration>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            start_path: DEFAULT_START_PATH.to_string(),
            display_zone: DisplayZone::Local,
            accepted_extensions: vec![".yaml".to_string()],
            request_timeout: None,
        }
    }
}

impl DashboardConfig {
    /// Load `.env` if present, then read the `OXN_*` variables.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            config.backend_url = url.trim().to_string();
        }
        if let Some(path) = lookup(ENV_START_PATH).filter(|v| !v.trim().is_empty()) {
            config = config.with_start_path(path.trim())?;
        }
        if let Some(zone) = lookup(ENV_TIMEZONE).filter(|v| !v.trim().is_empty()) {
            config.display_zone = zone.parse()?;
        }
        if let Some(exts) = lookup(ENV_ACCEPTED_EXTENSIONS) {
            let exts = parse_extensions(&exts);
            if exts.is_empty() {
                return Err(OxnError::Config(format!(
                    "{} must list at least one extension",
                    ENV_ACCEPTED_EXTENSIONS
                )));
            }
            config.accepted_extensions = exts;
        }
        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                OxnError::Config(format!("{} must be a whole number of seconds", ENV_REQUEST_TIMEOUT))
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_start_path(mut self, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if !path.contains("{id}") {
            return Err(OxnError::Config(format!(
                "start path '{}' has no {{id}} placeholder",
                path
            )));
        }
        self.start_path = path;
        Ok(self)
    }

    pub fn with_display_zone(mut self, zone: DisplayZone) -> Self {
        self.display_zone = zone;
        self
    }

    /// Start path for a concrete experiment.
    pub fn start_path_for(&self, id: &str) -> String {
        self.start_path.replace("{id}", id)
    }
}

/// Split a comma-separated extension list, normalizing to lower case with a leading dot.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .map(|e| if e.starts_with('.') { e } else { format!(".{}", e) })
        .collect()
}
