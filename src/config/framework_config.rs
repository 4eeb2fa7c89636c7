// Framework-wide configuration structures
// Serialized as TOML, every section falls back to its default

use serde::{Deserialize, Serialize};

use super::pool_config::PoolConfig;

/// Main framework configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub name: String,
    pub log_level: String,
}

/// Panel directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Name of the root container new panel visuals are attached to
    pub root_container: String,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            system: SystemConfig::default(),
            directory: DirectoryConfig::default(),
            pools: Vec::new(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: "UI Lifecycle".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            root_container: "Canvas".to_string(),
        }
    }
}

impl FrameworkConfig {
    /// Find the pool configuration for a key
    pub fn pool(&self, key: &str) -> Option<&PoolConfig> {
        self.pools.iter().find(|p| p.key == key)
    }

    /// Validate every pool section and reject duplicated keys
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for pool in &self.pools {
            pool.validate()?;
            if !seen.insert(pool.key.as_str()) {
                return Err(format!("pool '{}' is configured twice", pool.key));
            }
        }
        Ok(())
    }

    /// Parse the configured log level, unknown values fall back to Info
    pub fn log_level(&self) -> log::LevelFilter {
        self.system.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let config: FrameworkConfig = toml::from_str(
            r#"
            [system]
            name = "demo"
            log_level = "debug"

            [directory]
            root_container = "Root"

            [[pools]]
            key = "PooledPanelExample"
            preload_count = 2
            max_count = 3
            expand_step = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.directory.root_container, "Root");
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
        assert_eq!(config.pool("PooledPanelExample").unwrap().max_count, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_pool_rejected() {
        let mut config = FrameworkConfig::default();
        config.pools.push(PoolConfig::new("A"));
        config.pools.push(PoolConfig::new("A"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: FrameworkConfig = toml::from_str("").unwrap();
        assert_eq!(config.directory.root_container, "Canvas");
        assert!(config.pools.is_empty());
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }
}
