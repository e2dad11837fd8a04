//! Two-stage crawler verification.
//!
//! Stage 1 is a cheap User-Agent signature match that rejects almost
//! all traffic. Stage 2 confirms the claimed identity with reverse
//! DNS, a verified-suffix check, and a forward lookup of the resolved
//! hostname that must contain the original IP — a crawler can forge
//! its reverse records but not the forward zone of the claimed domain.
//! Lookup results are cached, with failures cached for a quarter of
//! the positive TTL.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mediagate_cache::keys;
use mediagate_core::traits::cache::CacheProvider;

use super::resolver::DnsResolver;

/// Runtime crawler policy assembled from settings.
#[derive(Debug, Clone)]
pub struct BotPolicy {
    /// User-Agent substrings that mark a request as a claimed crawler.
    pub signatures: Vec<String>,
    /// Hostname suffixes a verified crawler must reverse-resolve into.
    pub verified_domains: Vec<String>,
    /// TTL for positive DNS cache entries.
    pub dns_cache_ttl: Duration,
}

/// Cached reverse-lookup result. `None` is a remembered failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedHostname {
    hostname: Option<String>,
}

/// Cached forward-lookup result. Empty is a remembered failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedAddrs {
    addrs: Vec<IpAddr>,
}

/// Confirms claimed crawlers via signature match and double DNS.
#[derive(Debug, Clone)]
pub struct BotVerifier {
    resolver: Arc<dyn DnsResolver>,
    cache: Arc<dyn CacheProvider>,
}

impl BotVerifier {
    /// Create a new verifier.
    pub fn new(resolver: Arc<dyn DnsResolver>, cache: Arc<dyn CacheProvider>) -> Self {
        Self { resolver, cache }
    }

    /// Whether the request comes from a verified crawler.
    ///
    /// All four stages must pass. Any resolution failure, timeout, or
    /// cache problem degrades to `false`.
    pub async fn is_verified_bot(
        &self,
        user_agent: &str,
        ip: IpAddr,
        policy: &BotPolicy,
    ) -> bool {
        if user_agent.is_empty() {
            return false;
        }

        let ua = user_agent.to_lowercase();
        let signature_match = policy
            .signatures
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .any(|s| ua.contains(&s));
        if !signature_match {
            return false;
        }

        let hostname = match self.reverse_cached(ip, policy).await {
            Some(hostname) => hostname,
            None => return false,
        };

        let host_lc = hostname.to_lowercase();
        let suffix_match = policy
            .verified_domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .any(|d| host_lc.ends_with(&d));
        if !suffix_match {
            debug!(%ip, hostname, "Crawler hostname outside verified domains");
            return false;
        }

        let addrs = self.forward_cached(&hostname, policy).await;
        if addrs.contains(&ip) {
            true
        } else {
            debug!(%ip, hostname, "Forward DNS did not confirm crawler IP");
            false
        }
    }

    /// Reverse-resolve with caching. `None` covers failures, timeouts,
    /// and hostnames equal to the raw IP.
    async fn reverse_cached(&self, ip: IpAddr, policy: &BotPolicy) -> Option<String> {
        let key = keys::reverse_dns(ip);

        if let Ok(Some(raw)) = self.cache.get(&key).await {
            if let Ok(cached) = serde_json::from_str::<CachedHostname>(&raw) {
                return cached.hostname;
            }
        }

        let resolved = match self.resolver.reverse(ip).await {
            Ok(Some(hostname)) if hostname != ip.to_string() => Some(hostname),
            Ok(_) => None,
            Err(e) => {
                debug!(%ip, error = %e, "Reverse DNS lookup failed");
                None
            }
        };

        let ttl = if resolved.is_some() {
            policy.dns_cache_ttl
        } else {
            negative_ttl(policy.dns_cache_ttl)
        };
        self.cache_put(
            &key,
            &CachedHostname {
                hostname: resolved.clone(),
            },
            ttl,
        )
        .await;

        resolved
    }

    /// Forward-resolve with caching. Empty covers failures and timeouts.
    async fn forward_cached(&self, hostname: &str, policy: &BotPolicy) -> Vec<IpAddr> {
        let key = keys::forward_dns(hostname);

        if let Ok(Some(raw)) = self.cache.get(&key).await {
            if let Ok(cached) = serde_json::from_str::<CachedAddrs>(&raw) {
                return cached.addrs;
            }
        }

        let addrs = match self.resolver.forward(hostname).await {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!(hostname, error = %e, "Forward DNS lookup failed");
                Vec::new()
            }
        };

        let ttl = if addrs.is_empty() {
            negative_ttl(policy.dns_cache_ttl)
        } else {
            policy.dns_cache_ttl
        };
        self.cache_put(&key, &CachedAddrs { addrs: addrs.clone() }, ttl)
            .await;

        addrs
    }

    async fn cache_put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(e) = self.cache.set(key, &json, ttl).await {
                    warn!(key, error = %e, "Failed to cache DNS lookup");
                }
            }
            Err(e) => warn!(key, error = %e, "Failed to serialize DNS cache entry"),
        }
    }
}

fn negative_ttl(positive: Duration) -> Duration {
    (positive / 4).max(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use mediagate_cache::MemoryCacheProvider;
    use mediagate_core::config::cache::CacheConfig;
    use mediagate_core::error::AppError;
    use mediagate_core::result::AppResult;

    use super::super::defaults;
    use super::*;

    /// Resolver with scripted answers and a call counter.
    #[derive(Debug, Default)]
    struct ScriptedResolver {
        reverse: HashMap<IpAddr, Option<String>>,
        forward: HashMap<String, Vec<IpAddr>>,
        fail_all: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DnsResolver for ScriptedResolver {
        async fn reverse(&self, ip: IpAddr) -> AppResult<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(AppError::external_service("Reverse DNS lookup timed out"));
            }
            Ok(self.reverse.get(&ip).cloned().flatten())
        }

        async fn forward(&self, hostname: &str) -> AppResult<Vec<IpAddr>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(AppError::external_service("Forward DNS lookup timed out"));
            }
            Ok(self.forward.get(hostname).cloned().unwrap_or_default())
        }
    }

    fn policy() -> BotPolicy {
        BotPolicy {
            signatures: defaults::default_signatures(),
            verified_domains: defaults::default_verified_domains(),
            dns_cache_ttl: Duration::from_secs(3600),
        }
    }

    fn cache() -> Arc<MemoryCacheProvider> {
        Arc::new(MemoryCacheProvider::new(&CacheConfig {
            default_ttl_seconds: 60,
            memory: Default::default(),
        }))
    }

    fn googlebot_resolver(ip: IpAddr) -> ScriptedResolver {
        let mut resolver = ScriptedResolver::default();
        resolver
            .reverse
            .insert(ip, Some("crawl-66-249-66-1.googlebot.com".to_string()));
        resolver
            .forward
            .insert("crawl-66-249-66-1.googlebot.com".to_string(), vec![ip]);
        resolver
    }

    const UA: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    #[tokio::test]
    async fn verifies_genuine_crawler() {
        let ip: IpAddr = "66.249.66.1".parse().unwrap();
        let verifier = BotVerifier::new(Arc::new(googlebot_resolver(ip)), cache());

        assert!(verifier.is_verified_bot(UA, ip, &policy()).await);
    }

    #[tokio::test]
    async fn rejects_unmatched_user_agent() {
        let ip: IpAddr = "66.249.66.1".parse().unwrap();
        let verifier = BotVerifier::new(Arc::new(googlebot_resolver(ip)), cache());

        assert!(!verifier.is_verified_bot("Mozilla/5.0", ip, &policy()).await);
        assert!(!verifier.is_verified_bot("", ip, &policy()).await);
    }

    #[tokio::test]
    async fn rejects_when_reverse_lookup_fails() {
        let ip: IpAddr = "203.0.113.9".parse().unwrap();
        let verifier = BotVerifier::new(Arc::new(ScriptedResolver::default()), cache());

        assert!(!verifier.is_verified_bot(UA, ip, &policy()).await);
    }

    #[tokio::test]
    async fn rejects_unverified_suffix() {
        let ip: IpAddr = "203.0.113.9".parse().unwrap();
        let mut resolver = ScriptedResolver::default();
        resolver
            .reverse
            .insert(ip, Some("fake-googlebot.example.net".to_string()));
        let verifier = BotVerifier::new(Arc::new(resolver), cache());

        assert!(!verifier.is_verified_bot(UA, ip, &policy()).await);
    }

    #[tokio::test]
    async fn rejects_spoofed_reverse_records() {
        // Reverse record claims googlebot.com, but the forward zone
        // answers with a different address.
        let ip: IpAddr = "203.0.113.9".parse().unwrap();
        let other: IpAddr = "66.249.66.1".parse().unwrap();
        let mut resolver = ScriptedResolver::default();
        resolver
            .reverse
            .insert(ip, Some("crawl-66-249-66-1.googlebot.com".to_string()));
        resolver
            .forward
            .insert("crawl-66-249-66-1.googlebot.com".to_string(), vec![other]);
        let verifier = BotVerifier::new(Arc::new(resolver), cache());

        assert!(!verifier.is_verified_bot(UA, ip, &policy()).await);
    }

    #[tokio::test]
    async fn treats_resolver_timeout_as_not_verified() {
        let ip: IpAddr = "66.249.66.1".parse().unwrap();
        let resolver = ScriptedResolver {
            fail_all: true,
            ..Default::default()
        };
        let verifier = BotVerifier::new(Arc::new(resolver), cache());

        assert!(!verifier.is_verified_bot(UA, ip, &policy()).await);
    }

    #[tokio::test]
    async fn caches_lookups_across_requests() {
        let ip: IpAddr = "66.249.66.1".parse().unwrap();
        let resolver = Arc::new(googlebot_resolver(ip));
        let verifier = BotVerifier::new(resolver.clone(), cache());

        assert!(verifier.is_verified_bot(UA, ip, &policy()).await);
        let calls_after_first = resolver.calls.load(Ordering::SeqCst);
        assert!(verifier.is_verified_bot(UA, ip, &policy()).await);

        assert_eq!(resolver.calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test]
    async fn caches_negative_results() {
        let ip: IpAddr = "203.0.113.9".parse().unwrap();
        let resolver = Arc::new(ScriptedResolver::default());
        let verifier = BotVerifier::new(resolver.clone(), cache());

        assert!(!verifier.is_verified_bot(UA, ip, &policy()).await);
        let calls_after_first = resolver.calls.load(Ordering::SeqCst);
        assert!(!verifier.is_verified_bot(UA, ip, &policy()).await);

        assert_eq!(resolver.calls.load(Ordering::SeqCst), calls_after_first);
    }
}
