//! Bootstrap configuration.
//!
//! Everything the process needs before it can reach the database:
//! bind address, pool settings, cache sizing, the cookie secret, the
//! upload tree, delivery offload, the DNS bound, and logging. Runtime
//! policy (allow/deny lists, token defaults, crawler lists) lives in
//! the settings store instead and can change without a restart.
//!
//! Values merge in layers: `config/default.toml`, then the
//! environment-specific overlay, then `MEDIAGATE__`-prefixed
//! environment variables.

pub mod app;
pub mod auth;
pub mod bot;
pub mod cache;
pub mod delivery;
pub mod logging;
pub mod uploads;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::auth::AuthConfig;
use self::bot::BotConfig;
use self::cache::CacheConfig;
use self::delivery::DeliveryConfig;
use self::logging::LoggingConfig;
use self::uploads::UploadsConfig;

use crate::error::AppError;

/// The merged configuration tree, one field per TOML section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the HTTP server listens.
    pub server: ServerConfig,
    /// Connection pool settings.
    pub database: DatabaseConfig,
    /// In-process cache sizing and default lifetime.
    pub cache: CacheConfig,
    /// Identity-cookie verification settings.
    pub auth: AuthConfig,
    /// Location of the shared upload tree.
    pub uploads: UploadsConfig,
    /// Offload strategy for granted files.
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Resolver bound for crawler verification.
    #[serde(default)]
    pub bot: BotConfig,
    /// Log level and format.
    pub logging: LoggingConfig,
}

/// PostgreSQL pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: String,
    /// Pool ceiling.
    #[serde(default = "default_pool_max")]
    pub max_connections: u32,
    /// Connections kept warm.
    #[serde(default = "default_pool_min")]
    pub min_connections: u32,
    /// How long an acquire may wait, in seconds.
    #[serde(default = "default_acquire_seconds")]
    pub connect_timeout_seconds: u64,
    /// How long an idle connection is kept, in seconds.
    #[serde(default = "default_idle_seconds")]
    pub idle_timeout_seconds: u64,
}

impl AppConfig {
    /// Load and merge the configuration layers for `env`.
    ///
    /// Missing files are fine; a tree that does not deserialize into
    /// this schema is not.
    pub fn load(env: &str) -> Result<Self, AppError> {
        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIAGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(AppError::from)?
            .try_deserialize()
            .map_err(AppError::from)
    }
}

fn default_pool_max() -> u32 {
    20
}

fn default_pool_min() -> u32 {
    5
}

fn default_acquire_seconds() -> u64 {
    10
}

fn default_idle_seconds() -> u64 {
    300
}
