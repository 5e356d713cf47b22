use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{MappingError, Result};

/// Mapper configuration, usually read from a `globdoc.toml` file.
///
/// ```toml
/// [redis]
/// url = "${REDIS_URL}"
///
/// [store]
/// prefix = "globs"
/// database = "main"
/// batch_size = 500
/// reference_encoding = "embedded"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapperConfig {
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    "${REDIS_URL}".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Writes buffered by a bulk request before they are sent to the store.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub reference_encoding: ReferenceEncoding,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            database: default_database(),
            batch_size: default_batch_size(),
            reference_encoding: ReferenceEncoding::default(),
        }
    }
}

fn default_prefix() -> String {
    "globs".to_string()
}

fn default_database() -> String {
    "main".to_string()
}

fn default_batch_size() -> usize {
    500
}

/// How entity-reference fields are written into documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceEncoding {
    /// The referenced entity is written as a nested sub-document.
    #[default]
    Embedded,
    /// The referenced entity is written as `{"ref": collection, "id": key}`.
    DbRef,
}

impl MapperConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| MappingError::Config {
            message: format!("failed to parse configuration: {err}"),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| MappingError::Config {
            message: format!("failed to read {}: {err}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Get the Redis URL, expanding a `${VAR}` placeholder from the environment.
    pub fn redis_url(&self) -> Result<String> {
        let url = self.redis.url.as_str();
        if let Some(var_name) = url.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            std::env::var(var_name).map_err(|_| MappingError::Config {
                message: format!("environment variable {var_name} not set"),
            })
        } else {
            Ok(url.to_string())
        }
    }
}
