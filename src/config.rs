//! Dashboard configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the sentinel hub
    #[serde(default = "default_hub_url")]
    pub hub_url: String,

    /// Poll cadence in seconds (default: 5)
    ///
    /// Must stay below the 10s staleness threshold or liveness flaps.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request timeout in seconds (default: 4)
    ///
    /// Kept below the poll interval so a hung fetch cannot pile onto the
    /// next tick.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_hub_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    4
}

impl Config {
    /// Load configuration from file, or use defaults if no file exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            let home = dirs::home_dir()?;
            let default_path = home.join(".config/fleetwatch/config.toml");
            if default_path.exists() {
                Some(default_path)
            } else {
                None
            }
        });

        if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config: Self = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            config
                .validate()
                .with_context(|| format!("Invalid config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject intervals the pollers cannot run with.
    ///
    /// A zero interval would panic inside the tokio timer; this surfaces as
    /// a config error instead. CLI overrides re-validate after merging.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.poll_interval_secs >= 1,
            "poll_interval_secs must be at least 1"
        );
        anyhow::ensure!(
            self.request_timeout_secs >= 1,
            "request_timeout_secs must be at least 1"
        );
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub_url: default_hub_url(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_keep_polls_ahead_of_staleness() {
        let config = Config::default();

        assert!(config.poll_interval_secs * 1000 < crate::liveness::STALE_THRESHOLD_MS as u64);
        assert!(config.request_timeout_secs < config.poll_interval_secs);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hub_url = \"http://hub.internal:9000\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.hub_url, "http://hub.internal:9000");
        assert_eq!(config.poll_interval_secs, 5);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_secs = 0").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("poll_interval_secs"));
    }

    #[test]
    fn zero_request_timeout_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = 0").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("request_timeout_secs"));
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hub_url = [not, a, string").unwrap();

        assert!(Config::load(Some(file.path())).is_err());
    }
}
