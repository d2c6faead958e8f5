use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{MergeError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "NOTICE_MERGE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dates: DateFormats,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// chrono format strings for the two date renderings notices use.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DateFormats {
    #[serde(default = "default_numeric")]
    pub numeric: String,
    #[serde(default = "default_spelled")]
    pub spelled: String,
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            numeric: default_numeric(),
            spelled: default_spelled(),
        }
    }
}

impl DateFormats {
    /// `03/05/2024`
    pub fn numeric(&self, date: NaiveDate) -> String {
        date.format(&self.numeric).to_string()
    }

    /// `March 5, 2024`
    pub fn spelled(&self, date: NaiveDate) -> String {
        date.format(&self.spelled).to_string()
    }
}

fn default_numeric() -> String {
    "%m/%d/%Y".to_string()
}

fn default_spelled() -> String {
    "%B %-d, %Y".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub directory: String,
    #[serde(default = "default_log_file")]
    pub file_name: String,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file_name: default_log_file(),
            filter: default_filter(),
        }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_file() -> String {
    "notice_merge.log".to_string()
}

fn default_filter() -> String {
    "notice_merge=info".to_string()
}

impl Config {
    /// Loads `$NOTICE_MERGE_CONFIG`, else `config.toml`. A missing file means
    /// defaults; a malformed one is an error.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| MergeError::Internal {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| MergeError::Internal {
            message: format!("Failed to parse config file '{}': {}", path.display(), e),
        })
    }
}
