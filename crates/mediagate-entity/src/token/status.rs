//! Token status enumeration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an access token.
///
/// Permitted transitions: `Active → Expired` (lazy, time-triggered),
/// `Active → Used` (count-triggered, applied inside the consuming
/// update), `Active → Revoked` (explicit), and `Expired | Revoked →
/// Active` (reinstatement with a fresh expiry). `Used` tokens stay
/// used until their limit is raised and they are reinstated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "token_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    /// Token may be validated and consumed.
    Active,
    /// Token passed its expiry timestamp.
    Expired,
    /// Token reached its use limit.
    Used,
    /// Token was explicitly withdrawn.
    Revoked,
}

impl TokenStatus {
    /// Database/string representation of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Used => "used",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
