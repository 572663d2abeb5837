use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_VERSION: &str = "1.0";

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_notify_capacity() -> usize {
    100
}

fn default_redact_names() -> bool {
    true
}

/// Registry settings, loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default = "default_version")]
    pub version: String,
    /// Capacity of the update broadcast channel.
    #[serde(default = "default_notify_capacity")]
    pub notify_capacity: usize,
    /// Log only the file-name component of a job's original name.
    #[serde(default = "default_redact_names")]
    pub redact_names: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            notify_capacity: default_notify_capacity(),
            redact_names: default_redact_names(),
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RegistryConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<RegistryConfig, ConfigError> {
    let config: RegistryConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &RegistryConfig) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.notify_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "notifyCapacity must be greater than 0".to_string(),
        });
    }

    Ok(())
}
