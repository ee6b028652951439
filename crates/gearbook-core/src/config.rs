//! Application configuration management.
//!
//! Configuration is stored at `<platform config dir>/gearbook/config.json`
//! and holds the service base URL and the last used username. The base URL
//! may also come from the `GEARBOOK_API_BASE` environment variable.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "gearbook";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default service base URL when neither config nor environment sets one
const DEFAULT_BASE_URL: &str = "https://asset-booking-backend.vercel.app";

/// Environment variable overriding the service base URL
const BASE_URL_ENV: &str = "GEARBOOK_API_BASE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Directory holding the config file and the persisted token file.
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Resolution order: explicit config value, `GEARBOOK_API_BASE`, then
    /// the compiled-in default.
    pub fn resolve_base_url(&self) -> String {
        if let Some(ref url) = self.base_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                return url;
            }
        }
        DEFAULT_BASE_URL.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_base_url_wins() {
        let config = Config {
            base_url: Some("http://localhost:8050".to_string()),
            last_username: None,
        };
        assert_eq!(config.resolve_base_url(), "http://localhost:8050");
    }

    #[test]
    fn default_base_url_applies_when_unset() {
        // The env var is not set under `cargo test`; an empty config falls
        // through to the compiled-in default.
        let config = Config::default();
        if std::env::var(BASE_URL_ENV).is_err() {
            assert_eq!(config.resolve_base_url(), DEFAULT_BASE_URL);
        }
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config {
            base_url: Some("http://localhost:8050".to_string()),
            last_username: Some("ada".to_string()),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.base_url, config.base_url);
        assert_eq!(parsed.last_username, config.last_username);
    }
}
