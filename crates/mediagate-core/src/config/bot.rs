//! Crawler verification configuration.

use serde::{Deserialize, Serialize};

/// Bootstrap settings for the crawler verifier.
///
/// Signature and verified-domain lists are runtime settings; only the
/// resolver bound lives here. A lookup that exceeds the timeout counts
/// as a verification failure, never as bot-positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Upper bound for a single DNS resolution, in milliseconds.
    #[serde(default = "default_dns_timeout_ms")]
    pub dns_timeout_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            dns_timeout_ms: default_dns_timeout_ms(),
        }
    }
}

fn default_dns_timeout_ms() -> u64 {
    500
}
