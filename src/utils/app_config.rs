/// Application configuration management
///
/// Optional TOML file, read once at startup from `--config <FILE>` or
/// ~/.config/stackwatch/config.toml:
///
/// ```toml
/// title = "Kotlin Microservices Monitor"
/// interval = "300ms"
/// list_timeout = "5s"
/// inspect_timeout = "2s"
///
/// [[services]]
/// name = "Kafka"
/// container = "ms-kotlin-kafka"
/// port = 9092
/// category = "infra"
/// ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::registry::{Registry, Service};
use crate::utils::helpers::{parse_interval, DEFAULT_INTERVAL};

pub const DEFAULT_TITLE: &str = "Kotlin Microservices Monitor";
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_INSPECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub title: Option<String>,
    pub interval: Option<String>,
    pub list_timeout: Option<String>,
    pub inspect_timeout: Option<String>,
    #[serde(default)]
    pub services: Vec<Service>,
}

/// Effective runtime settings after merging file and command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub title: String,
    pub interval: Duration,
    pub list_timeout: Duration,
    pub inspect_timeout: Duration,
}

impl AppConfig {
    /// Get default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stackwatch").join("config.toml"))
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Load an explicitly requested file, else the default file if present,
    /// else the built-in defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Tracked services; the built-in stack when the file lists none
    pub fn registry(&self) -> Result<Registry> {
        if self.services.is_empty() {
            return Ok(Registry::default());
        }

        Registry::new(self.services.clone()).context("Invalid [[services]] configuration")
    }

    /// Merge with the command line; a CLI interval wins over the file's
    pub fn settings(&self, cli_interval: Option<Duration>) -> Result<Settings> {
        let interval = match (cli_interval, self.interval.as_deref()) {
            (Some(interval), _) => interval,
            (None, Some(raw)) => {
                parse_interval(raw).ok_or_else(|| anyhow!("Invalid interval `{}` in config file", raw))?
            }
            (None, None) => DEFAULT_INTERVAL,
        };

        Ok(Settings {
            title: self.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            interval,
            list_timeout: parse_timeout("list_timeout", self.list_timeout.as_deref(), DEFAULT_LIST_TIMEOUT)?,
            inspect_timeout: parse_timeout(
                "inspect_timeout",
                self.inspect_timeout.as_deref(),
                DEFAULT_INSPECT_TIMEOUT,
            )?,
        })
    }
}

fn parse_timeout(key: &str, raw: Option<&str>, default: Duration) -> Result<Duration> {
    match raw {
        None => Ok(default),
        Some(raw) => humantime::parse_duration(raw)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .ok_or_else(|| anyhow!("Invalid {} `{}` in config file", key, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ServiceCategory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::default();
        let settings = config.settings(None).unwrap();

        assert_eq!(settings.title, DEFAULT_TITLE);
        assert_eq!(settings.interval, DEFAULT_INTERVAL);
        assert_eq!(settings.list_timeout, DEFAULT_LIST_TIMEOUT);
        assert_eq!(settings.inspect_timeout, DEFAULT_INSPECT_TIMEOUT);
        assert_eq!(config.registry().unwrap(), Registry::default());
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
            title = "Shop Stack"
            interval = "1.5"
            inspect_timeout = "750ms"

            [[services]]
            name = "Postgres"
            container = "shop-postgres"
            port = 5432
            category = "infra"

            [[services]]
            name = "Checkout"
            container = "shop-checkout"
            port = "8080"
            category = "app"
            "#,
        );

        let config = AppConfig::discover(Some(file.path())).unwrap();
        let settings = config.settings(None).unwrap();
        assert_eq!(settings.title, "Shop Stack");
        assert_eq!(settings.interval, Duration::from_millis(1500));
        assert_eq!(settings.inspect_timeout, Duration::from_millis(750));

        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.services()[0].port, "5432");
        assert_eq!(registry.services()[1].category, ServiceCategory::App);
    }

    #[test]
    fn test_cli_interval_overrides_file() {
        let config = AppConfig {
            interval: Some("5".to_string()),
            ..Default::default()
        };
        let settings = config.settings(Some(Duration::from_millis(100))).unwrap();
        assert_eq!(settings.interval, Duration::from_millis(100));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let config = AppConfig {
            interval: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(config.settings(None).is_err());

        let config = AppConfig {
            list_timeout: Some("0s".to_string()),
            ..Default::default()
        };
        assert!(config.settings(None).is_err());
    }

    #[test]
    fn test_duplicate_services_are_rejected() {
        let file = write_config(
            r#"
            [[services]]
            name = "A"
            container = "dup"
            port = 1
            category = "infra"

            [[services]]
            name = "B"
            container = "dup"
            port = 2
            category = "app"
            "#,
        );

        let config = AppConfig::load(file.path()).unwrap();
        assert!(config.registry().is_err());
    }

    #[test]
    fn test_unknown_keys_and_missing_file() {
        let file = write_config("refresh = 3\n");
        assert!(AppConfig::load(file.path()).is_err());

        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::discover(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
