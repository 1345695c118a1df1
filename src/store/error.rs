use std::path::PathBuf;
use thiserror::Error;

use crate::config::{SettingKey, SettingsError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path} line {line} is not valid UTF-8: {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Setting error: {0}")]
    Setting(#[from] SettingsError),

    #[error("Retention limit '{key}' must not be negative (got {value})")]
    NegativeLimit { key: SettingKey, value: i64 },
}

pub type Result<T> = std::result::Result<T, StoreError>;
