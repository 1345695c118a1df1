use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "LINESTORE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/linestore.toml";
const ENV_PREFIX: &str = "LINESTORE";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_from_sources(config_path)
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // LINESTORE__STORAGE__DATA_DIR -> storage.data_dir
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[storage]
data_dir = "/var/lib/browser"

[settings.completion]
history_length = 100
web_history_max_items = 0

[files.cmd-history]
file = "cmd-history"
limit = "completion.history_length"

[files.session]
file = "session.bin"
binary = true
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/browser"));
        assert_eq!(config.settings["completion"]["history_length"], 100);
        assert_eq!(config.settings["completion"]["web_history_max_items"], 0);

        assert_eq!(config.files.len(), 2);
        let history = &config.files["cmd-history"];
        assert_eq!(history.limit.as_ref().unwrap().to_string(), "completion.history_length");
        assert!(!history.binary);
        assert!(config.files["session"].binary);
        assert!(config.files["session"].limit.is_none());
    }

    // Environment overrides are not exercised here: env::set_var is unsafe
    // under edition 2024 and would race with parallel tests.
}
