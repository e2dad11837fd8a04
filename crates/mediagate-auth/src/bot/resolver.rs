//! DNS resolution behind a trait, with a bounded timeout.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;

use mediagate_core::config::bot::BotConfig;
use mediagate_core::error::{AppError, ErrorKind};
use mediagate_core::result::AppResult;

/// Reverse and forward DNS lookups.
///
/// Abstracted so the verifier can be exercised with scripted answers.
/// `Ok(None)` / `Ok(vec![])` mean the name genuinely has no records;
/// `Err` covers timeouts and transport failures. The verifier treats
/// both the same way — not verified.
#[async_trait]
pub trait DnsResolver: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve an IP to its PTR hostname, if any.
    async fn reverse(&self, ip: IpAddr) -> AppResult<Option<String>>;

    /// Resolve a hostname to its address set.
    async fn forward(&self, hostname: &str) -> AppResult<Vec<IpAddr>>;
}

/// System-configured resolver with a hard per-lookup deadline.
#[derive(Debug)]
pub struct HickoryDnsResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl HickoryDnsResolver {
    /// Create a resolver using the system default upstream servers.
    pub fn new(config: &BotConfig) -> Self {
        let timeout = Duration::from_millis(config.dns_timeout_ms);
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
            timeout,
        }
    }
}

#[async_trait]
impl DnsResolver for HickoryDnsResolver {
    async fn reverse(&self, ip: IpAddr) -> AppResult<Option<String>> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.reverse_lookup(ip))
            .await
            .map_err(|_| AppError::external_service("Reverse DNS lookup timed out"))?;

        match lookup {
            Ok(ptr) => Ok(ptr
                .iter()
                .next()
                .map(|name| name.to_string().trim_end_matches('.').to_string())),
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorKind::ExternalService,
                "Reverse DNS lookup failed",
                e,
            )),
        }
    }

    async fn forward(&self, hostname: &str) -> AppResult<Vec<IpAddr>> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.lookup_ip(hostname))
            .await
            .map_err(|_| AppError::external_service("Forward DNS lookup timed out"))?;

        match lookup {
            Ok(ips) => Ok(ips.iter().collect()),
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::ExternalService,
                "Forward DNS lookup failed",
                e,
            )),
        }
    }
}
