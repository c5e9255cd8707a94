//! Engine configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Engine options, loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// Enable the shared cross-context decision cache.
    pub cache_enable: bool,

    /// Lifetime of a cached decision, in minutes.
    pub cache_duration: u64,

    /// Role names granted blanket bypass when explicitly wired into a
    /// manager. The checker itself never consults this list.
    pub admin_roles: Vec<String>,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            cache_enable: false,
            cache_duration: 1,
            admin_roles: Vec::new(),
        }
    }
}

impl RbacConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Cache TTL as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_duration * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RbacConfig::parse("").unwrap();
        assert!(!config.cache_enable);
        assert_eq!(config.cache_duration, 1);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert!(config.admin_roles.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let config = RbacConfig::parse(
            r#"
cache_enable = true
cache_duration = 5
admin_roles = ["Admin"]
"#,
        )
        .unwrap();
        assert!(config.cache_enable);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.admin_roles, ["Admin"]);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            RbacConfig::parse("cache_enable = \"maybe\""),
            Err(Error::Parse(_))
        ));
    }
}
