//! Configuration management
//!
//! Settings live in `config.toml` inside the s3fc config directory
//! (`$S3FC_CONFIG_DIR`, or the platform config dir). A missing file means
//! defaults; command-line overrides are applied on top by the caller.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::timeseries::DEFAULT_DATE_COLUMN;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "S3FC_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";
const SCHEMA_VERSION: u32 = 1;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub merge: MergeSettings,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            store: StoreSettings::default(),
            merge: MergeSettings::default(),
        }
    }
}

/// Connection settings for the object store
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoreSettings {
    /// Custom endpoint for S3-compatible servers
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Static access key; must be paired with `secret_key`
    #[serde(default)]
    pub access_key: Option<String>,

    #[serde(default)]
    pub secret_key: Option<String>,

    /// Shared credentials profile name
    #[serde(default)]
    pub profile: Option<String>,

    /// Use path-style addressing (needed by most self-hosted servers)
    #[serde(default)]
    pub force_path_style: bool,
}

impl StoreSettings {
    /// Check the settings for mistakes that would only surface on first use
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint)
                .map_err(|e| Error::Config(format!("Invalid endpoint '{endpoint}': {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "Endpoint must use http or https: {endpoint}"
                )));
            }
        }

        match (&self.access_key, &self.secret_key) {
            (Some(_), None) | (None, Some(_)) => Err(Error::Auth(
                "Incomplete credentials provided.".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Defaults for the time-series merge
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeSettings {
    #[serde(default = "default_date_column")]
    pub date_column: String,
}

fn default_date_column() -> String {
    DEFAULT_DATE_COLUMN.to_string()
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            date_column: default_date_column(),
        }
    }
}

/// Loads and saves the configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Use the default config directory
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .map(|d| d.join("s3fc"))
                .ok_or_else(|| Error::Config("Cannot determine config directory".to_string()))?,
        };
        Ok(Self::with_dir(dir))
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            config_path: dir.as_ref().join(CONFIG_FILE),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration, falling back to defaults when absent
    pub fn load(&self) -> Result<Config> {
        let content = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.config_path.display(), "No config file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = toml::from_str(&content)?;
        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Unsupported schema version {} (expected <= {SCHEMA_VERSION})",
                config.schema_version
            )));
        }
        config.store.validate()?;
        Ok(config)
    }
}
