//! Configuration types for podcast-items

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest accepted look-back window for download selection, in days (100 years)
pub const MAX_DAYS_TO_DOWNLOAD: u32 = 36_500;

/// Download selection and queue configuration
///
/// Groups settings related to which items are picked up for download and how
/// many run at once. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Only items published within this many days are candidates for download (default: 30)
    #[serde(default = "default_number_of_days_to_download")]
    pub number_of_days_to_download: u32,

    /// Maximum concurrent downloads (default: 3)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            number_of_days_to_download: default_number_of_days_to_download(),
            max_concurrent_downloads: default_max_concurrent(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./podcast-server.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Main configuration for the item layer
///
/// Download settings are flattened so the serialized form stays flat; the
/// persistence block is nested under `persistence`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download selection and queue settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Data storage
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Number of days to look back when selecting items to download
    pub fn number_of_days_to_download(&self) -> u32 {
        self.download.number_of_days_to_download
    }

    /// Parse a configuration from JSON, applying defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::Config {
                message: "max_concurrent_downloads must be at least 1".to_string(),
                key: Some("max_concurrent_downloads".to_string()),
            });
        }
        if self.download.number_of_days_to_download > MAX_DAYS_TO_DOWNLOAD {
            return Err(Error::Config {
                message: format!(
                    "number_of_days_to_download must be at most {}",
                    MAX_DAYS_TO_DOWNLOAD
                ),
                key: Some("number_of_days_to_download".to_string()),
            });
        }
        Ok(())
    }
}

fn default_number_of_days_to_download() -> u32 {
    30
}

fn default_max_concurrent() -> usize {
    3
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./podcast-server.db")
}
