//! Session cookie verification configuration.

use serde::{Deserialize, Serialize};

/// Settings for validating the host's signed identity cookie.
///
/// The signing scheme is a frozen contract shared with the host
/// application: `secret_key` must be the same value the host uses to
/// sign its cookies, or every session check will fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to derive per-cookie signing keys.
    pub secret_key: String,
    /// Name of the identity cookie to look for.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

fn default_cookie_name() -> String {
    "mg_session".to_string()
}
