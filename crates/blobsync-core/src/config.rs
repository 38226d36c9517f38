//! Configuration module

use crate::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Local staging of remote inputs and outputs
    #[serde(default)]
    pub localize: LocalizeConfig,
    /// Modification time aggregation settings
    #[serde(default)]
    pub mtime: MtimeConfig,
    /// Provider credentials
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Localization configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizeConfig {
    /// Directory to stage remote paths in; unset means work on URIs directly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Always re-download, even when the local copy is current
    #[serde(default)]
    pub force: bool,
}

/// Modification time configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtimeConfig {
    /// How many levels below a directory count towards its mtime
    #[serde(default = "default_dir_depth")]
    pub dir_depth: usize,
}

impl Default for MtimeConfig {
    fn default() -> Self {
        Self {
            dir_depth: default_dir_depth(),
        }
    }
}

fn default_dir_depth() -> usize {
    1
}

/// Credentials configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Service account key file; falls back to the environment when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<PathBuf>,
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir().ok_or_else(|| {
            Error::Config("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join("blobsync").join("config.toml"))
    }

    /// Get default configuration content with comments
    pub fn default_config_content() -> String {
        r#"# Blobsync Configuration File

[localize]
# Directory to download remote inputs into and stage outputs in.
# Leave unset to hand remote URIs to jobs unchanged.
# root = "/tmp/blobsync"
# Re-download even when the local copy is already current
force = false

[mtime]
# Levels below a directory that count towards its modification time
dir_depth = 1

[credentials]
# Service account key file (otherwise read from the environment)
# service_account = "/path/to/key.json"
"#
        .to_string()
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config {:?}: {}", path, e)))
    }

    /// Save configuration to a file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Load the user configuration, or defaults if there is none
    pub fn load_or_default() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }
}
