//! Typed runtime-settings facade.
//!
//! Policy that operators change at runtime (allow/deny lists, token
//! defaults, crawler lists, cleanup behaviour) lives in the `settings`
//! key-value table rather than the bootstrap configuration. This
//! module reads raw JSON values through a [`SettingsSource`], caches
//! them with the application cache's TTL, and hands callers typed
//! values with documented defaults.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::warn;

use mediagate_auth::bot::defaults;
use mediagate_auth::bot::verifier::BotPolicy;
use mediagate_cache::keys;
use mediagate_core::result::AppResult;
use mediagate_core::traits::cache::CacheProvider;
use mediagate_database::repositories::settings::SettingsRepository;

use crate::rules::AccessLists;
use crate::token::{CleanupOptions, TokenDefaults};

/// Raw access to the settings store.
#[async_trait]
pub trait SettingsSource: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch a raw setting value by key.
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>>;
}

#[async_trait]
impl SettingsSource for SettingsRepository {
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        SettingsRepository::get(self, key).await
    }
}

/// Settings source held entirely in process memory, for tests and
/// embedded use.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    values: DashMap<String, serde_json::Value>,
}

impl InMemorySettings {
    /// Create an empty source; every read falls back to defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw setting value.
    pub fn put(&self, key: &str, value: serde_json::Value) {
        self.values.insert(key.to_string(), value);
    }
}

#[async_trait]
impl SettingsSource for InMemorySettings {
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        Ok(self.values.get(key).map(|entry| entry.clone()))
    }
}

/// What to do with files under the upload tree that no resource
/// record manages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmanagedPolicy {
    /// Serve unmanaged files publicly.
    #[default]
    Serve,
    /// Deny unmanaged files and redirect to the fallback.
    Deny,
}

/// Setting keys. One constant per key so callers and seeds agree.
mod key {
    pub const ACCESS_LISTS: &str = "access_lists";
    pub const TOKEN_DEFAULTS: &str = "token_defaults";
    pub const DEFAULT_REDIRECT_URL: &str = "default_redirect_url";
    pub const UNMANAGED_POLICY: &str = "unmanaged_policy";
    pub const ALLOW_BOTS: &str = "allow_bots";
    pub const BOT_SIGNATURES: &str = "bot_signatures";
    pub const BOT_VERIFIED_DOMAINS: &str = "bot_verified_domains";
    pub const DNS_CACHE_TTL_SECONDS: &str = "dns_cache_ttl_seconds";
    pub const CLEANUP: &str = "cleanup";
}

/// Typed, cached access to runtime settings.
#[derive(Debug, Clone)]
pub struct SettingsProvider {
    source: Arc<dyn SettingsSource>,
    cache: Arc<dyn CacheProvider>,
    cache_ttl: Duration,
}

impl SettingsProvider {
    /// Create a provider over a source and a cache.
    pub fn new(
        source: Arc<dyn SettingsSource>,
        cache: Arc<dyn CacheProvider>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            cache_ttl,
        }
    }

    /// Site-wide allow/deny lists. Defaults to empty lists.
    pub async fn access_lists(&self) -> AppResult<AccessLists> {
        self.read(key::ACCESS_LISTS, AccessLists::default).await
    }

    /// Global token expiry and use-limit defaults.
    pub async fn token_defaults(&self) -> AppResult<TokenDefaults> {
        self.read(key::TOKEN_DEFAULTS, || TokenDefaults {
            expiry_seconds: 86_400,
            max_uses: 1,
        })
        .await
    }

    /// Site-wide denial redirect target, if configured.
    pub async fn default_redirect_url(&self) -> AppResult<Option<String>> {
        self.read(key::DEFAULT_REDIRECT_URL, || None).await
    }

    /// Policy for files no resource record manages.
    pub async fn unmanaged_policy(&self) -> AppResult<UnmanagedPolicy> {
        self.read(key::UNMANAGED_POLICY, UnmanagedPolicy::default)
            .await
    }

    /// Whether verified crawlers may access protected resources when
    /// the resource itself says `inherit`.
    pub async fn allow_bots(&self) -> AppResult<bool> {
        self.read(key::ALLOW_BOTS, || true).await
    }

    /// The assembled crawler-verification policy.
    pub async fn bot_policy(&self) -> AppResult<BotPolicy> {
        let signatures = self
            .read(key::BOT_SIGNATURES, defaults::default_signatures)
            .await?;
        let verified_domains = self
            .read(key::BOT_VERIFIED_DOMAINS, defaults::default_verified_domains)
            .await?;
        let ttl_seconds: u64 = self.read(key::DNS_CACHE_TTL_SECONDS, || 3600).await?;

        Ok(BotPolicy {
            signatures,
            verified_domains,
            dns_cache_ttl: Duration::from_secs(ttl_seconds),
        })
    }

    /// Cleanup-sweep behaviour.
    pub async fn cleanup_options(&self) -> AppResult<CleanupOptions> {
        self.read(key::CLEANUP, || CleanupOptions {
            delete_enabled: false,
            delete_age_months: 6,
        })
        .await
    }

    /// Read one setting through the cache, falling back to `default`
    /// when the key is absent or its stored value does not parse.
    async fn read<T, F>(&self, name: &str, default: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let cache_key = keys::setting(name);

        if let Ok(Some(raw)) = self.cache.get(&cache_key).await {
            if let Ok(value) = serde_json::from_str(&raw) {
                return Ok(value);
            }
        }

        let stored = self.source.get(name).await?;
        let value = match stored {
            Some(raw) => match serde_json::from_value::<T>(raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(setting = name, error = %e, "Stored setting is malformed, using default");
                    default()
                }
            },
            None => default(),
        };

        match serde_json::to_string(&value) {
            Ok(json) => {
                if let Err(e) = self.cache.set(&cache_key, &json, self.cache_ttl).await {
                    warn!(setting = name, error = %e, "Failed to cache setting");
                }
            }
            Err(e) => warn!(setting = name, error = %e, "Failed to serialize setting for cache"),
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use mediagate_cache::MemoryCacheProvider;
    use mediagate_core::config::cache::CacheConfig;

    use super::*;

    fn provider(source: Arc<InMemorySettings>) -> SettingsProvider {
        let cache = Arc::new(MemoryCacheProvider::new(&CacheConfig {
            default_ttl_seconds: 60,
            memory: Default::default(),
        }));
        SettingsProvider::new(source, cache, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn defaults_apply_when_store_is_empty() {
        let p = provider(Arc::new(InMemorySettings::new()));

        let defaults = p.token_defaults().await.unwrap();
        assert_eq!(defaults.expiry_seconds, 86_400);
        assert_eq!(defaults.max_uses, 1);

        assert_eq!(p.unmanaged_policy().await.unwrap(), UnmanagedPolicy::Serve);
        assert!(p.allow_bots().await.unwrap());
        assert!(p.default_redirect_url().await.unwrap().is_none());

        let lists = p.access_lists().await.unwrap();
        assert!(lists.user_allow.is_empty());

        let bot = p.bot_policy().await.unwrap();
        assert!(bot.signatures.iter().any(|s| s == "googlebot"));
        assert_eq!(bot.dns_cache_ttl, Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn stored_values_override_defaults() {
        let source = Arc::new(InMemorySettings::new());
        source.put(
            "token_defaults",
            serde_json::json!({"expiry_seconds": 3600, "max_uses": 3}),
        );
        source.put("unmanaged_policy", serde_json::json!("deny"));
        source.put("allow_bots", serde_json::json!(false));
        let p = provider(source);

        let defaults = p.token_defaults().await.unwrap();
        assert_eq!(defaults.expiry_seconds, 3600);
        assert_eq!(defaults.max_uses, 3);
        assert_eq!(p.unmanaged_policy().await.unwrap(), UnmanagedPolicy::Deny);
        assert!(!p.allow_bots().await.unwrap());
    }

    #[tokio::test]
    async fn malformed_stored_value_falls_back_to_default() {
        let source = Arc::new(InMemorySettings::new());
        source.put("allow_bots", serde_json::json!("definitely"));
        let p = provider(source);

        assert!(p.allow_bots().await.unwrap());
    }

    #[tokio::test]
    async fn reads_come_from_cache_after_first_hit() {
        let source = Arc::new(InMemorySettings::new());
        source.put("allow_bots", serde_json::json!(false));
        let p = provider(source.clone());

        assert!(!p.allow_bots().await.unwrap());

        // A store change is invisible until the cached entry ages out.
        source.put("allow_bots", serde_json::json!(true));
        assert!(!p.allow_bots().await.unwrap());
    }
}
