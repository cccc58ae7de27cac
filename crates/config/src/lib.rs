#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for zi
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (`~/.config/0install.net/injector/zi.toml`)
//! - Environment variables
//! - CLI flags
//!
//! The result is turned into the solver [`Policy`] with [`Config::policy`].

mod interval;

pub use interval::TimeInterval;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use zi_errors::{ConfigError, Error};
use zi_types::{ArchPolicy, NetworkUse, Policy, Stability};

/// Settings readable and writable by name
pub const SETTINGS: [&str; 3] = ["network_use", "freshness", "help_with_testing"];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network_use: NetworkUse,

    /// How old feeds may get before they should be refreshed; zero disables
    #[serde(default = "default_freshness")]
    pub freshness: TimeInterval,

    /// Accept `testing` implementations in the primary tier
    #[serde(default)]
    pub help_with_testing: bool,

    #[serde(default)]
    pub paths: PathConfig,

    /// Override the host-derived architecture list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<ArchPolicy>,
}

/// Path configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Implementation store directories searched for cached implementations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub store_roots: Vec<PathBuf>,
    /// Catalog file used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network_use: NetworkUse::Full,
            freshness: default_freshness(),
            help_with_testing: false,
            paths: PathConfig::default(),
            architecture: None,
        }
    }
}

fn default_freshness() -> TimeInterval {
    TimeInterval::from_days(30)
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join("0install.net")
            .join("injector")
            .join("zi.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Write configuration to `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<(), Error> {
        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            error: e.to_string(),
        })?;

        let write_error = |e: std::io::Error| ConfigError::WriteError {
            path: path.display().to_string(),
            error: e.to_string(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        fs::write(path, contents).await.map_err(write_error)?;
        debug!(path = %path.display(), "saved configuration");
        Ok(())
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // ZI_NETWORK_USE
        if let Ok(network_use) = std::env::var("ZI_NETWORK_USE") {
            self.network_use = network_use
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "ZI_NETWORK_USE".to_string(),
                    value: network_use,
                })?;
        }

        // ZI_HELP_WITH_TESTING
        if let Ok(help) = std::env::var("ZI_HELP_WITH_TESTING") {
            self.help_with_testing =
                parse_bool(&help).ok_or_else(|| ConfigError::InvalidValue {
                    field: "ZI_HELP_WITH_TESTING".to_string(),
                    value: help,
                })?;
        }

        // ZI_FRESHNESS
        if let Ok(freshness) = std::env::var("ZI_FRESHNESS") {
            self.freshness = freshness.parse()?;
        }

        Ok(())
    }

    /// Current value of a named setting, formatted for display
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownSetting` for names outside [`SETTINGS`].
    pub fn get_value(&self, name: &str) -> Result<String, Error> {
        let value = match name {
            "network_use" => self.network_use.to_string(),
            "freshness" => self.freshness.to_string(),
            "help_with_testing" => self.help_with_testing.to_string(),
            _ => {
                return Err(ConfigError::UnknownSetting {
                    name: name.to_string(),
                }
                .into())
            }
        };
        Ok(value)
    }

    /// Parse and store a named setting
    ///
    /// Booleans are case-insensitive (`True`, `falsE`, ...).
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names or values that do not parse.
    pub fn set_value(&mut self, name: &str, value: &str) -> Result<(), Error> {
        match name {
            "network_use" => self.network_use = value.parse()?,
            "freshness" => self.freshness = value.parse()?,
            "help_with_testing" => {
                self.help_with_testing =
                    parse_bool(value).ok_or_else(|| ConfigError::InvalidValue {
                        field: name.to_string(),
                        value: value.to_string(),
                    })?;
            }
            _ => {
                return Err(ConfigError::UnknownSetting {
                    name: name.to_string(),
                }
                .into())
            }
        }
        Ok(())
    }

    /// Every named setting with its display value
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("network_use", self.network_use.to_string()),
            ("freshness", self.freshness.to_string()),
            ("help_with_testing", self.help_with_testing.to_string()),
        ]
    }

    /// Selection policy described by this configuration
    #[must_use]
    pub fn policy(&self) -> Policy {
        let threshold = if self.help_with_testing {
            Stability::Testing
        } else {
            Stability::Stable
        };
        Policy::default()
            .with_stability_threshold(threshold)
            .with_network_use(self.network_use)
            .with_architecture(self.architecture.clone().unwrap_or_else(ArchPolicy::host))
    }

    /// Implementation store roots (with default)
    #[must_use]
    pub fn store_roots(&self) -> Vec<PathBuf> {
        if !self.paths.store_roots.is_empty() {
            return self.paths.store_roots.clone();
        }
        let mut roots = Vec::new();
        if let Some(cache) = dirs::cache_dir() {
            roots.push(cache.join("0install.net").join("implementations"));
        }
        roots.push(PathBuf::from("/var/cache/0install.net/implementations"));
        roots
    }

    /// Catalog file path (with default)
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.paths.catalog.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("0install.net")
                .join("zi")
                .join("catalog.json")
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.get_value("network_use").unwrap(), "full");
        assert_eq!(config.get_value("freshness").unwrap(), "30d");
        assert_eq!(config.get_value("help_with_testing").unwrap(), "false");
        assert_eq!(config.entries().len(), SETTINGS.len());
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();
        config.set_value("freshness", "5m").unwrap();
        config.set_value("help_with_testing", "True").unwrap();
        config.set_value("network_use", "minimal").unwrap();
        assert_eq!(config.freshness.as_secs(), 5 * 60);
        assert!(config.help_with_testing);
        assert_eq!(config.network_use, NetworkUse::Minimal);

        config.set_value("help_with_testing", "falsE").unwrap();
        assert!(!config.help_with_testing);

        assert!(config.set_value("help_with_testing", "maybe").is_err());
        assert!(matches!(
            config.set_value("colour", "blue"),
            Err(Error::Config(ConfigError::UnknownSetting { .. }))
        ));
    }

    #[test]
    fn test_policy_threshold() {
        let mut config = Config::default();
        assert_eq!(config.policy().stability_threshold, Stability::Stable);
        config.help_with_testing = true;
        assert_eq!(config.policy().stability_threshold, Stability::Testing);

        config.architecture = Some(ArchPolicy::any());
        assert_eq!(config.policy().architecture, ArchPolicy::any());
    }

    #[test]
    fn test_toml_shape() {
        let config: Config = toml::from_str(
            r#"
network_use = "off-line"
freshness = "2d"

[paths]
store_roots = ["/tmp/store"]
"#,
        )
        .unwrap();
        assert_eq!(config.network_use, NetworkUse::Offline);
        assert_eq!(config.freshness.as_secs(), 2 * 24 * 60 * 60);
        assert!(!config.help_with_testing);
        assert_eq!(config.store_roots(), vec![PathBuf::from("/tmp/store")]);
    }
}
