//! Configuration management for linestore
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! The `[settings]` tables become a runtime [`Settings`] store. Retention
//! limits of bounded files are read from it, and changing a value through
//! [`Settings::set`] notifies every store watching that key.
//!
//! # Usage
//!
//! ```no_run
//! use linestore::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Line files live in: {}", config.storage.data_dir.display());
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `LINESTORE__<section>__<key>`
//!
//! Examples:
//! - `LINESTORE__STORAGE__DATA_DIR=/var/lib/app`
//! - `LINESTORE__SETTINGS__COMPLETION__HISTORY_LENGTH=0`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/linestore.toml`.
//! This can be overridden using the `LINESTORE_CONFIG` environment variable.

mod models;
mod settings;
mod sources;
mod validation;

pub use models::{Config, FileConfig, StorageConfig};
pub use settings::{ChangeHandler, SettingKey, Settings, SettingsError, SubscriptionId};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

use crate::store::resolve_path;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`LINESTORE__*`)
    /// 2. TOML file (default: `config/linestore.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (dangling or negative limits, clashing paths)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Build the runtime settings store from the `[settings]` tables
    pub fn settings(&self) -> Settings {
        Settings::from_values(self.settings.iter().flat_map(|(section, options)| {
            options
                .iter()
                .map(move |(option, value)| (SettingKey::new(section, option), *value))
        }))
    }

    /// Absolute or `data_dir`-relative path of a configured file
    ///
    /// Returns `None` for unknown files and files with an empty path.
    pub fn file_path(&self, name: &str) -> Option<PathBuf> {
        let file = self.files.get(name)?;
        if file.file.as_os_str().is_empty() {
            return None;
        }
        Some(resolve_path(&self.storage.data_dir, &file.file))
    }
}
