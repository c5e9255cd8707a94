//! Configuration loading from warden.toml.

use std::path::{Path, PathBuf};

use rbac::RbacConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Storage backend selection.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Engine options (cache settings, admin roles).
    #[serde(flatten)]
    pub rbac: RbacConfig,
}

/// Storage backend configuration.
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Backend name: "sqlite" or "file".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Database path (sqlite backend).
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Item definitions document (file backend).
    #[serde(default = "default_items_file")]
    pub items_file: PathBuf,

    /// Assignment definitions document (file backend).
    #[serde(default = "default_assigns_file")]
    pub assigns_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            db_path: default_db_path(),
            items_file: default_items_file(),
            assigns_file: default_assigns_file(),
        }
    }
}

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_db_path() -> PathBuf {
    "warden.db".into()
}

fn default_items_file() -> PathBuf {
    "rbac/items.toml".into()
}

fn default_assigns_file() -> PathBuf {
    "rbac/assigns.toml".into()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("unknown storage backend '{name}': expected \"sqlite\" or \"file\"")]
    UnknownBackend { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.storage.backend, "sqlite");
        assert_eq!(config.storage.db_path, PathBuf::from("warden.db"));
        assert!(!config.rbac.cache_enable);
        assert!(config.rbac.admin_roles.is_empty());
    }

    #[test]
    fn test_parse_full() {
        let config = Config::parse(
            r#"
cache_enable = true
cache_duration = 10
admin_roles = ["Admin"]

[storage]
backend = "file"
items_file = "acl/items.toml"
assigns_file = "acl/assigns.toml"
"#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, "file");
        assert_eq!(config.storage.items_file, PathBuf::from("acl/items.toml"));
        assert!(config.rbac.cache_enable);
        assert_eq!(config.rbac.admin_roles, ["Admin"]);
    }
}
