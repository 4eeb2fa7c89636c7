// Configuration module for the pool and panel directory settings
// TOML on disk, defaults when no file is present

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod framework_config;
pub mod pool_config;

pub use framework_config::*;
pub use pool_config::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration manager: owns the path and the loaded `FrameworkConfig`
pub struct ConfigManager {
    config_path: PathBuf,
    config: FrameworkConfig,
    loaded: bool,
}

impl ConfigManager {
    /// Create configuration manager with the default path
    pub fn new() -> Self {
        Self::with_path("ui_lifecycle.toml")
    }

    /// Create configuration manager with a custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
            config: FrameworkConfig::default(),
            loaded: false,
        }
    }

    /// Load and validate the configuration file
    pub fn load(&mut self) -> Result<(), ConfigError> {
        let content = fs::read_to_string(&self.config_path)
            .map_err(|_| ConfigError::FileNotFound(self.config_path.display().to_string()))?;
        let config: FrameworkConfig = toml::from_str(&content)?;
        config.validate().map_err(ConfigError::Invalid)?;

        log::info!(
            "配置已加载: {} ({} 个对象池)",
            self.config_path.display(),
            config.pools.len()
        );
        self.config = config;
        self.loaded = true;
        Ok(())
    }

    /// Load with fallback to defaults if the file is missing or invalid
    pub fn load_or_default(&mut self) -> &Self {
        if let Err(e) = self.load() {
            log::warn!("Failed to load config, using defaults: {}", e);
            self.config = FrameworkConfig::default();
            self.loaded = true;
        }
        self
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    /// Get mutable configuration
    pub fn config_mut(&mut self) -> &mut FrameworkConfig {
        &mut self.config
    }

    /// Save current configuration
    pub fn save(&self) -> Result<(), ConfigError> {
        let toml_str =
            toml::to_string_pretty(&self.config).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.config_path, toml_str)?;
        Ok(())
    }

    /// Check if configuration is loaded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_manager_creation() {
        let manager = ConfigManager::new();
        assert!(!manager.is_loaded());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let mut manager = ConfigManager::with_path("/nonexistent/ui_lifecycle.toml");
        assert!(matches!(manager.load(), Err(ConfigError::FileNotFound(_))));

        manager.load_or_default();
        assert!(manager.is_loaded());
        assert_eq!(manager.config().directory.root_container, "Canvas");
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("ui_lifecycle_{}.toml", uuid::Uuid::new_v4()));
        let mut manager = ConfigManager::with_path(&path);
        manager
            .config_mut()
            .pools
            .push(PoolConfig::new("ListItem").with_preload(4).with_max(8));
        manager.save().unwrap();

        let mut reloaded = ConfigManager::with_path(&path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.config().pool("ListItem").unwrap().max_count, 8);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_pool_rejected_on_load() {
        let path = std::env::temp_dir().join(format!("ui_lifecycle_{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "[[pools]]\nkey = \"Bad\"\npreload_count = 9\nmax_count = 3\n",
        )
        .unwrap();

        let mut manager = ConfigManager::with_path(&path);
        assert!(matches!(manager.load(), Err(ConfigError::Invalid(_))));

        let _ = fs::remove_file(&path);
    }
}
