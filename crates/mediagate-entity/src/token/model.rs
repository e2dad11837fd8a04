//! Access token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::TokenStatus;

/// A time- and count-limited capability granting access to one resource.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessToken {
    /// Opaque high-entropy secret; globally unique lookup key.
    pub value: String,
    /// The resource this token grants access to. Immutable.
    pub resource_id: Uuid,
    /// Account the token was issued to, if any.
    pub owner_id: Option<i64>,
    /// Email the token was issued to, if any.
    pub owner_email: Option<String>,
    /// IP the token was issued from, if any.
    pub owner_ip: Option<String>,
    /// When the token was created. Immutable.
    pub created_at: DateTime<Utc>,
    /// When the token expires; `None` means it never expires.
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

impl AccessToken {
    /// Whether the expiry timestamp has passed at `now`.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }

    /// Whether the use limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.max_uses > 0 && self.use_count >= self.max_uses
    }
}

/// Data for a token that has been generated but not yet stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDraft {
    /// Generated secret value.
    pub value: String,
    /// The resource this token will grant access to.
    pub resource_id: Uuid,
    /// Account the token is issued to, if any.
    pub owner_id: Option<i64>,
    /// Email the token is issued to, if any.
    pub owner_email: Option<String>,
    /// IP the token is issued from, if any.
    pub owner_ip: Option<String>,
    /// Creation timestamp to persist.
    pub created_at: DateTime<Utc>,
    /// Resolved expiry; `None` means the token never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Resolved use limit; `0` means unlimited.
    pub max_uses: i32,
}

impl TokenDraft {
    /// Materialize the stored row this draft will become.
    pub fn into_token(self) -> AccessToken {
        AccessToken {
            value: self.value,
            resource_id: self.resource_id,
            owner_id: self.owner_id,
            owner_email: self.owner_email,
            owner_ip: self.owner_ip,
            created_at: self.created_at,
            expires_at: self.expires_at,
            use_count: 0,
            max_uses: self.max_uses,
            last_used_at: None,
            status: TokenStatus::Active,
        }
    }
}
