use std::time::Duration;

use crate::network::{Network, MANTLE_SEPOLIA};
use crate::{Error, Result};

/// All configuration loaded from environment variables at startup.
/// Every variable is optional; malformed values are reported as
/// `Error::Config` instead of being silently defaulted.
#[derive(Debug, Clone)]
pub struct Config {
    // Backend
    pub network: &'static Network,
    pub api_base_url: String,
    pub http_timeout: Duration,

    // Polling
    pub poll_interval: Duration,

    // Trusted data-source table; `None` uses the bundled table.
    pub data_sources_path: Option<String>,

    // Dashboard
    pub dashboard_port: u16,
    /// Expose the backend's round controls as POST routes on the dashboard API.
    pub admin_controls: bool,
}

impl Config {
    const DEFAULT_POLL_SECS: u64 = 5;
    const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_DASHBOARD_PORT: u16 = 8080;

    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = match non_empty(&lookup, "VERDICT_NETWORK") {
            Some(slug) => Network::from_slug(&slug)?,
            None => &MANTLE_SEPOLIA,
        };

        let api_base_url = non_empty(&lookup, "VERDICT_API_URL")
            .unwrap_or_else(|| network.api_base_url.to_string())
            .trim_end_matches('/')
            .to_string();

        let poll_secs: u64 = parse_or(&lookup, "POLL_INTERVAL_SECS", Self::DEFAULT_POLL_SECS)?;
        if poll_secs == 0 {
            return Err(Error::Config("POLL_INTERVAL_SECS must be at least 1".into()));
        }

        Ok(Config {
            network,
            api_base_url,
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                Self::DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            poll_interval: Duration::from_secs(poll_secs),
            data_sources_path: non_empty(&lookup, "DATA_SOURCES_PATH"),
            dashboard_port: parse_or(&lookup, "DASHBOARD_PORT", Self::DEFAULT_DASHBOARD_PORT)?,
            admin_controls: parse_or(&lookup, "ADMIN_CONTROLS", false)?,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: '{raw}'"))),
        None => Ok(default),
    }
}
