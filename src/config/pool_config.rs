// Pool configuration structures
// One PoolConfig per pool, immutable once the pool has been created

use serde::{Deserialize, Serialize};

/// Behaviour of `Pool::spawn` once `total_created == max_count` and nothing is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Fail the request with `PoolError::CapacityExceeded`
    #[default]
    Reject,
    /// Hand out an entity the pool never tracks; it is not counted and cannot be despawned
    Unmanaged,
}

/// Pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Logical pool key (the UI type name the pool serves)
    pub key: String,
    #[serde(default = "default_preload_count")]
    pub preload_count: usize,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    #[serde(default = "default_expand_step")]
    pub expand_step: usize,
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

fn default_preload_count() -> usize {
    10
}

fn default_max_count() -> usize {
    100
}

fn default_expand_step() -> usize {
    5
}

impl PoolConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            preload_count: default_preload_count(),
            max_count: default_max_count(),
            expand_step: default_expand_step(),
            overflow: OverflowPolicy::default(),
        }
    }

    pub fn with_preload(mut self, preload_count: usize) -> Self {
        self.preload_count = preload_count;
        self
    }

    pub fn with_max(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn with_expand_step(mut self, expand_step: usize) -> Self {
        self.expand_step = expand_step;
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Check the numeric invariants before a pool is built from this config
    pub fn validate(&self) -> Result<(), String> {
        if self.key.is_empty() {
            return Err("pool key must not be empty".to_string());
        }
        if self.preload_count > self.max_count {
            return Err(format!(
                "pool '{}': preload_count {} exceeds max_count {}",
                self.key, self.preload_count, self.max_count
            ));
        }
        if self.expand_step == 0 {
            return Err(format!("pool '{}': expand_step must be greater than 0", self.key));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_defaults() {
        let config = PoolConfig::new("Toast");
        assert_eq!(config.preload_count, 10);
        assert_eq!(config.max_count, 100);
        assert_eq!(config.expand_step, 5);
        assert_eq!(config.overflow, OverflowPolicy::Reject);

        let config = config.with_preload(2).with_max(3).with_expand_step(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_numbers() {
        assert!(PoolConfig::new("A").with_preload(5).with_max(4).validate().is_err());
        assert!(PoolConfig::new("A").with_expand_step(0).validate().is_err());
        assert!(PoolConfig::new("").validate().is_err());
        // max == preload is allowed, the pool simply never grows
        assert!(PoolConfig::new("A").with_preload(4).with_max(4).validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: PoolConfig = toml::from_str(
            r#"
            key = "ListItem"
            max_count = 20
            overflow = "unmanaged"
            "#,
        )
        .unwrap();
        assert_eq!(config.preload_count, 10);
        assert_eq!(config.max_count, 20);
        assert_eq!(config.overflow, OverflowPolicy::Unmanaged);
    }
}
