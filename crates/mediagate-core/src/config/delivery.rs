//! File delivery and offload configuration.

use serde::{Deserialize, Serialize};

/// Reverse-proxy families that support internal-redirect offload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyFamily {
    /// nginx — offload via `X-Accel-Redirect`.
    Nginx,
    /// LiteSpeed — offload via `X-LiteSpeed-Location`.
    Litespeed,
}

/// How granted files leave the process.
///
/// Offload is attempted in order: proxy internal redirect (requires both
/// `proxy` and `internal_prefix`), then `X-Sendfile`, then direct
/// streaming from this process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// The front-end server sitting in front of this process, if any.
    #[serde(default)]
    pub proxy: Option<ProxyFamily>,
    /// Internal location alias the proxy maps onto the upload root.
    #[serde(default)]
    pub internal_prefix: Option<String>,
    /// Whether the serving environment honours `X-Sendfile`.
    #[serde(default)]
    pub sendfile: bool,
}
