//! Request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mediagate_service::token::TokenOverrides;

/// Body for issuing a token against a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTokenRequest {
    /// The resource the token grants access to.
    pub resource_id: Uuid,
    /// Explicit absolute expiry; discarded unless strictly future.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Explicit relative lifetime in seconds; `<= 0` means never expires.
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
    /// Explicit use limit; `0` means unlimited.
    #[serde(default)]
    pub max_uses: Option<i32>,
    /// Account the token is issued to.
    #[serde(default)]
    pub owner_id: Option<i64>,
    /// Email the token is issued to.
    #[serde(default)]
    pub owner_email: Option<String>,
    /// IP the token is issued from.
    #[serde(default)]
    pub owner_ip: Option<String>,
}

impl IssueTokenRequest {
    /// The token overrides this request carries.
    pub fn overrides(&self) -> TokenOverrides {
        TokenOverrides {
            expires_at: self.expires_at,
            expires_in_seconds: self.expires_in_seconds,
            max_uses: self.max_uses,
            owner_id: self.owner_id,
            owner_email: self.owner_email.clone(),
            owner_ip: self.owner_ip.clone(),
        }
    }
}

/// Body for reinstating an expired or revoked token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReinstateTokenRequest {
    /// Explicit absolute expiry for the reinstated token.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Explicit relative lifetime in seconds.
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

impl ReinstateTokenRequest {
    /// The expiry overrides this request carries.
    pub fn overrides(&self) -> TokenOverrides {
        TokenOverrides {
            expires_at: self.expires_at,
            expires_in_seconds: self.expires_in_seconds,
            ..Default::default()
        }
    }
}

/// Body for changing a token's use limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMaxUsesRequest {
    /// The new use limit; `0` means unlimited.
    pub max_uses: i32,
}
