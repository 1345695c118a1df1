use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::settings::SettingKey;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    /// Integer settings by section, then option
    #[serde(default)]
    pub settings: BTreeMap<String, BTreeMap<String, i64>>,
    /// Managed line files by name
    #[serde(default)]
    pub files: BTreeMap<String, FileConfig>,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding every line file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// A managed line file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileConfig {
    /// File name relative to `storage.data_dir` (absolute paths are kept)
    pub file: PathBuf,
    /// Store raw bytes instead of UTF-8 text
    #[serde(default)]
    pub binary: bool,
    /// Setting holding the retention limit; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<SettingKey>,
}
