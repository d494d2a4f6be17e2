use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::model::TemperatureUnit;

pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_MODEL: &str = "gfs_seamless";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("tempcast/", env!("CARGO_PKG_VERSION"));

/// Forecast models offered by the interactive configuration.
pub const KNOWN_MODELS: &[&str] = &[
    "gfs_seamless",
    "best_match",
    "icon_seamless",
    "ecmwf_ifs025",
    "meteofrance_seamless",
];

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// model = "gfs_seamless"
/// temperature_unit = "fahrenheit"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Open-Meteo forecast endpoint.
    pub forecast_url: String,

    /// Nominatim base URL; `/search` is appended.
    pub geocoder_url: String,

    /// Forecast model identifier sent as `models`.
    pub model: String,

    pub temperature_unit: TemperatureUnit,

    /// Upper bound for each network call.
    pub timeout_secs: u64,

    /// Nominatim rejects requests without an identifying User-Agent.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature_unit: TemperatureUnit::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "tempcast", "tempcast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be at least 1"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must not be empty"));
        }
        let urls = [
            ("forecast_url", &self.forecast_url),
            ("geocoder_url", &self.geocoder_url),
        ];
        for (name, url) in urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow!("{name} must be an http(s) URL, got '{url}'"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_open_meteo_request() {
        let cfg = Config::default();

        assert_eq!(cfg.model, "gfs_seamless");
        assert_eq!(cfg.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config {
            model: "icon_seamless".into(),
            temperature_unit: TemperatureUnit::Celsius,
            timeout_secs: 3,
            ..Config::default()
        };
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let contents = "temperature_unit = \"celsius\"\n";
        fs::write(&path, contents).unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(cfg.model, DEFAULT_MODEL);
    }

    #[test]
    fn invalid_values_are_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Invalid config file"));
        assert!(msg.contains("timeout_secs"));
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let contents = "temperature_unit = \"kelvin\"\n";
        fs::write(&path, contents).unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn non_http_urls_are_rejected() {
        let cfg = Config {
            forecast_url: "ftp://example.com".into(),
            ..Config::default()
        };

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("forecast_url"));
    }
}
