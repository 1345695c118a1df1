use super::models::Config;
use super::settings::SettingKey;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("storage.data_dir must not be empty")]
    EmptyDataDir,

    #[error("File '{name}' has an empty path")]
    EmptyFilePath { name: String },

    #[error("Files '{first}' and '{second}' resolve to the same path")]
    DuplicateFilePath { first: String, second: String },

    #[error("File '{name}' references non-existent setting '{limit}'")]
    InvalidLimitReference { name: String, limit: SettingKey },

    #[error("Retention limit '{limit}' used by file '{name}' must not be negative: {value}")]
    NegativeLimit {
        name: String,
        limit: SettingKey,
        value: i64,
    },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_storage(config)?;
    validate_files(config)?;
    validate_limits(config)?;
    Ok(())
}

fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.data_dir.as_os_str().is_empty() {
        return Err(ValidationError::EmptyDataDir);
    }
    Ok(())
}

/// Every file needs a path, and no two files may share one
fn validate_files(config: &Config) -> Result<(), ValidationError> {
    let mut seen = HashMap::new();

    for name in config.files.keys() {
        let path = config
            .file_path(name)
            .ok_or_else(|| ValidationError::EmptyFilePath { name: name.clone() })?;

        if let Some(first) = seen.insert(path, name) {
            return Err(ValidationError::DuplicateFilePath {
                first: first.clone(),
                second: name.clone(),
            });
        }
    }

    Ok(())
}

/// Limit references must exist and hold a non-negative value
fn validate_limits(config: &Config) -> Result<(), ValidationError> {
    for (name, file) in &config.files {
        let Some(limit) = &file.limit else {
            continue;
        };

        let value = config
            .settings
            .get(&limit.section)
            .and_then(|options| options.get(&limit.option))
            .ok_or_else(|| ValidationError::InvalidLimitReference {
                name: name.clone(),
                limit: limit.clone(),
            })?;

        if *value < 0 {
            return Err(ValidationError::NegativeLimit {
                name: name.clone(),
                limit: limit.clone(),
                value: *value,
            });
        }
    }

    Ok(())
}
