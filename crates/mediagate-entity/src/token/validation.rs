//! Token validation outcomes.

use serde::{Deserialize, Serialize};

use mediagate_core::types::DenyReason;

/// Result of checking a presented token against a resource.
///
/// Validation is a pure read: a `Expired` result for a stale but still
/// `active` row does not mutate the row — the caller persists the lazy
/// transition separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenValidation {
    /// Token is active, unexpired, under its limit, and bound to the
    /// requested resource. Required before consumption.
    Valid,
    /// No token with that value exists.
    NotFound,
    /// Token exists but belongs to a different resource.
    InvalidResource,
    /// Token expiry has passed (or the row is already marked expired).
    Expired,
    /// Token use limit reached (or the row is already marked used).
    UsedLimitReached,
    /// Token was revoked.
    Revoked,
}

impl TokenValidation {
    /// The denial reason a failed validation maps to.
    ///
    /// Returns `None` for [`TokenValidation::Valid`].
    pub fn deny_reason(self) -> Option<DenyReason> {
        match self {
            Self::Valid => None,
            Self::NotFound => Some(DenyReason::TokenNotFound),
            Self::InvalidResource => Some(DenyReason::TokenInvalidResource),
            Self::Expired => Some(DenyReason::TokenExpired),
            Self::UsedLimitReached => Some(DenyReason::TokenUsedLimitReached),
            Self::Revoked => Some(DenyReason::TokenRevoked),
        }
    }
}
