//! Cache configuration.

use serde::{Deserialize, Serialize};

/// Cache provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default TTL applied when a caller does not specify one, in seconds.
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
    /// In-memory cache sizing.
    #[serde(default)]
    pub memory: MemoryCacheConfig,
}

/// Sizing for the in-memory cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries kept in memory.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl_seconds() -> u64 {
    60
}

fn default_max_capacity() -> u64 {
    10_000
}
