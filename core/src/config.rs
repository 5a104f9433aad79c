//! Configuration for the core crate
//!
//! A registry is configured with its admin principal and, for hosts that
//! persist state, the location of the snapshot file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use log::LevelFilter;
use serde::{Serialize, Deserialize};

use crate::error::{CoreError, Result};
use crate::models::Principal;

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// The single principal allowed to verify batches
    pub admin: Principal,

    /// Where a persisting host keeps the registry snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to enable debug mode; raises `log_level` to at least `debug`
    #[serde(default)]
    pub debug_mode: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RegistryConfig {
    /// Create a new configuration with default values
    pub fn new(admin: impl Into<Principal>) -> Self {
        RegistryConfig {
            admin: admin.into(),
            snapshot_path: None,
            log_level: default_log_level(),
            debug_mode: false,
        }
    }

    /// Set the snapshot location
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Check the configuration before a registry is built from it
    pub fn validate(&self) -> Result<()> {
        // An empty admin would match any caller that presents an empty identity
        if self.admin.is_empty() {
            return Err(CoreError::Config("admin principal must not be empty".to_string()));
        }
        Ok(())
    }

    /// Log filter a host should install
    ///
    /// In debug mode a plain level quieter than `debug` is raised to `debug`.
    /// Anything else, including per-module filter directives, is returned
    /// unchanged.
    pub fn effective_log_level(&self) -> &str {
        match LevelFilter::from_str(&self.log_level) {
            Ok(level) if self.debug_mode && level < LevelFilter::Debug => "debug",
            _ => &self.log_level,
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: RegistryConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Create a development configuration
    pub fn development(admin: impl Into<Principal>) -> Self {
        let mut config = Self::new(admin);
        config.debug_mode = true;
        config.log_level = "debug".to_string();
        config
    }

    /// Create a testing configuration
    pub fn testing(admin: impl Into<Principal>) -> Self {
        let mut config = Self::development(admin);
        config.log_level = "trace".to_string();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    const ADMIN: &str = "ST1ADMIN000000000000000000000000000000000";

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::new(ADMIN);

        assert_eq!(config.admin, Principal::new(ADMIN));
        assert!(config.snapshot_path.is_none());
        assert_eq!(config.log_level, "info");
        assert!(!config.debug_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_and_testing_configs() {
        let dev = RegistryConfig::development(ADMIN);
        assert!(dev.debug_mode);
        assert_eq!(dev.log_level, "debug");

        let test = RegistryConfig::testing(ADMIN);
        assert!(test.debug_mode);
        assert_eq!(test.log_level, "trace");
    }

    #[rstest]
    #[case::plain("info", false, "info")]
    #[case::debug_raises_info("info", true, "debug")]
    #[case::debug_raises_off("off", true, "debug")]
    #[case::debug_keeps_trace("trace", true, "trace")]
    #[case::debug_keeps_directives("crop_registry_core=warn", true, "crop_registry_core=warn")]
    fn test_effective_log_level(#[case] level: &str, #[case] debug_mode: bool, #[case] expected: &str) {
        let mut config = RegistryConfig::new(ADMIN);
        config.log_level = level.to_string();
        config.debug_mode = debug_mode;

        assert_eq!(config.effective_log_level(), expected);
    }

    #[test]
    fn test_empty_admin_rejected() {
        let config = RegistryConfig::new("");
        match config.validate() {
            Err(CoreError::Config(msg)) => assert!(msg.contains("admin")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_defaults_when_fields_missing() {
        let json = format!(r#"{{"admin":"{}"}}"#, ADMIN);
        let config: RegistryConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.log_level, "info");
        assert!(!config.debug_mode);
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn test_config_file_io() {
        let config = RegistryConfig::new(ADMIN).with_snapshot_path("/var/lib/crops/state.json");

        let temp_file = NamedTempFile::new().unwrap();
        config.to_file(temp_file.path()).unwrap();

        let loaded = RegistryConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.admin, config.admin);
        assert_eq!(loaded.snapshot_path, config.snapshot_path);
        assert_eq!(loaded.log_level, config.log_level);
    }

    #[test]
    fn test_config_file_with_empty_admin_fails() {
        let temp_file = NamedTempFile::new().unwrap();
        RegistryConfig::new("").to_file(temp_file.path()).unwrap();

        assert!(matches!(
            RegistryConfig::from_file(temp_file.path()),
            Err(CoreError::Config(_))
        ));
    }
}
