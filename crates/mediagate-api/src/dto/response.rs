//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mediagate_entity::token::{AccessToken, TokenStatus};
use mediagate_service::token::{CleanupReport, IssuedToken};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A token as returned by the administration API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The token value.
    pub value: String,
    /// The resource the token grants access to.
    pub resource_id: Uuid,
    /// Account the token was issued to, if any.
    pub owner_id: Option<i64>,
    /// Email the token was issued to, if any.
    pub owner_email: Option<String>,
    /// IP the token was issued from, if any.
    pub owner_ip: Option<String>,
    /// When the token was created.
    pub created_at: DateTime<Utc>,
    /// When the token expires; absent means never.
    pub expires_at: Option<DateTime<Utc>>,
    /// Number of recorded uses.
    pub use_count: i32,
    /// Use limit; `0` means unlimited.
    pub max_uses: i32,
    /// When the token was last consumed.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Lifecycle state.
    pub status: TokenStatus,
}

impl From<AccessToken> for TokenResponse {
    fn from(token: AccessToken) -> Self {
        Self {
            value: token.value,
            resource_id: token.resource_id,
            owner_id: token.owner_id,
            owner_email: token.owner_email,
            owner_ip: token.owner_ip,
            created_at: token.created_at,
            expires_at: token.expires_at,
            use_count: token.use_count,
            max_uses: token.max_uses,
            last_used_at: token.last_used_at,
            status: token.status,
        }
    }
}

/// A freshly issued token with its access URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedTokenResponse {
    /// The token value.
    pub value: String,
    /// Full tokenized URL for the resource.
    pub url: String,
    /// Resolved expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Resolved use limit.
    pub max_uses: i32,
}

impl From<IssuedToken> for IssuedTokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            value: issued.value,
            url: issued.url,
            expires_at: issued.expires_at,
            max_uses: issued.max_uses,
        }
    }
}

/// What a cleanup sweep did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    /// Active tokens transitioned to expired.
    pub expired: u64,
    /// Aged non-active tokens deleted.
    pub deleted: u64,
}

impl From<CleanupReport> for CleanupResponse {
    fn from(report: CleanupReport) -> Self {
        Self {
            expired: report.expired,
            deleted: report.deleted,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Database connectivity.
    pub database: String,
}
