//! Bridge configuration (`.bridgerc.toml`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = ".bridgerc.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub arrays: ArrayConfig,

    #[serde(default)]
    pub errors: ErrorConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayConfig {
    #[serde(default)]
    pub ragged: RaggedPolicy,
}

/// Handling of non-rectangular input for multidimensional array targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaggedPolicy {
    /// Dimensions are the maximum length seen per depth; short rows are
    /// padded with the element default
    #[default]
    Tolerate,
    /// Sibling sequences must agree in length
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorConfig {
    /// Append the offending value's repr to sequence-shape failures
    #[serde(default = "default_true")]
    pub include_repr: bool,

    #[serde(default = "default_repr_len")]
    pub max_repr_len: usize,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            include_repr: true,
            max_repr_len: default_repr_len(),
        }
    }
}

fn default_true() -> bool { true }
fn default_repr_len() -> usize { 80 }

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Find and load `.bridgerc.toml` from current directory or parents
    pub fn discover() -> Self {
        let mut current = std::env::current_dir().ok();

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(path = %config_path.display(), error = %e, "Ignoring config"),
                }
            }

            current = dir.parent().map(|p| p.to_path_buf());
        }

        Self::default()
    }

    /// Generate default configuration file content
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate config"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn with_ragged(mut self, policy: RaggedPolicy) -> Self {
        self.arrays.ragged = policy;
        self
    }
}
