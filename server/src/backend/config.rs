//! # Configuration
//!
//! Server, storage and farm settings, loaded from a YAML file. Every field has
//! a default, so an empty or missing file yields a working in-memory setup.
//!
//! Resolution order:
//! 1. the file named by `FARM_CONFIG`, which must exist
//! 2. `./farm.yaml` when present
//! 3. built-in defaults
//!
//! `FARM_BIND_ADDRESS` and `FARM_DATA_DIR` are applied on top. Setting a data
//! directory switches the store to the file backend.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "FARM_CONFIG";
pub const BIND_ADDRESS_ENV: &str = "FARM_BIND_ADDRESS";
pub const DATA_DIR_ENV: &str = "FARM_DATA_DIR";
const DEFAULT_CONFIG_FILE: &str = "farm.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub farm: FarmSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Origin allowed to call the API from a browser
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Only used by the file backend. Defaults to `<Documents>/Rabbit Farm`
    pub data_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmSettings {
    /// Cage capacity used for the available-cages statistic
    pub total_cages: u32,
    pub export_prefix: String,
    pub default_admin: AdminSeed,
}

impl Default for FarmSettings {
    fn default() -> Self {
        Self {
            total_cages: 12,
            export_prefix: shared::DEFAULT_EXPORT_PREFIX.to_string(),
            default_admin: AdminSeed::default(),
        }
    }
}

/// Account created when the users collection is empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub full_name: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            full_name: "Farm Administrator".to_string(),
        }
    }
}

impl FarmConfig {
    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Invalid configuration")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse configuration {}", path.display()))
    }

    /// Load configuration from the environment-selected file and apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => {
                info!("Loading configuration from {}", PathBuf::from(&path).display());
                Self::from_file(path)?
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                info!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => {
                info!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(
            std::env::var(BIND_ADDRESS_ENV).ok(),
            std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
        );
        Ok(config)
    }

    /// Apply explicit overrides (normally read from the environment)
    pub fn apply_overrides(&mut self, bind_address: Option<String>, data_directory: Option<PathBuf>) {
        if let Some(address) = bind_address.filter(|a| !a.trim().is_empty()) {
            self.server.bind_address = address;
        }
        if let Some(directory) = data_directory {
            self.storage.backend = StorageBackend::File;
            self.storage.data_directory = Some(directory);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = FarmConfig::default();
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.server.cors_origin, "http://localhost:8080");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.farm.total_cages, 12);
        assert_eq!(config.farm.export_prefix, "rabbit_farm_data");
        assert_eq!(config.farm.default_admin.username, "admin");
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = FarmConfig::from_yaml(
            "storage:\n  backend: file\n  data_directory: /var/lib/farm\nfarm:\n  total_cages: 40\n",
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.data_directory, Some(PathBuf::from("/var/lib/farm")));
        assert_eq!(config.farm.total_cages, 40);
        assert_eq!(config.farm.default_admin.password, "admin123");
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(FarmConfig::from_yaml("").unwrap(), FarmConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(FarmConfig::from_yaml("storage:\n  backend: postgres\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("farm.yaml");
        std::fs::write(&path, "server:\n  bind_address: 0.0.0.0:8000\n").unwrap();

        let config = FarmConfig::from_file(&path).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8000");

        assert!(FarmConfig::from_file(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = FarmConfig::default();
        config.apply_overrides(Some("0.0.0.0:9000".to_string()), Some(PathBuf::from("/tmp/farm")));

        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.data_directory, Some(PathBuf::from("/tmp/farm")));

        let mut config = FarmConfig::default();
        config.apply_overrides(Some("  ".to_string()), None);
        assert_eq!(config, FarmConfig::default());
    }
}
