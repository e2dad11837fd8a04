//! The access-decision reason vocabulary.
//!
//! Every grant carries an [`AccessReason`] and every denial a
//! [`DenyReason`]. Denial slugs are appended to the fallback redirect
//! as an opaque query parameter, so they form a stable external
//! vocabulary — renaming one is a breaking change for consumers.

use serde::{Deserialize, Serialize};

/// Why a request was granted access to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    /// File exists in the upload tree but is not a managed resource,
    /// and policy says to serve such files publicly.
    UnmanagedPublic,
    /// The resource is managed but not flagged as protected.
    Unprotected,
    /// Principal id is on the global user allow list.
    GlobalUserAllow,
    /// Principal id is on the resource's user allow list.
    ResourceUserAllow,
    /// A principal role is on the global role allow list.
    GlobalRoleAllow,
    /// A principal role is on the resource's role allow list.
    ResourceRoleAllow,
    /// The requester is a verified crawler.
    VerifiedBot,
    /// A valid access token was presented and consumed.
    Token,
}

impl AccessReason {
    /// Grants that are safe to cache publicly.
    pub fn is_public(self) -> bool {
        matches!(
            self,
            Self::UnmanagedPublic | Self::Unprotected | Self::VerifiedBot
        )
    }

    /// Token grants are downloads; everything else renders inline.
    pub fn is_token(self) -> bool {
        matches!(self, Self::Token)
    }
}

/// Why a request was denied access to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The path escaped the upload root or the file is unreadable.
    InvalidPath,
    /// No managed resource matches and policy says deny unmanaged files.
    UnmanagedRestricted,
    /// Principal id is on the global user deny list.
    GlobalUserDeny,
    /// Principal id is on the resource's user deny list.
    ResourceUserDeny,
    /// A principal role is on the global role deny list.
    GlobalRoleDeny,
    /// A principal role is on the resource's role deny list.
    ResourceRoleDeny,
    /// No token with the presented value exists.
    TokenNotFound,
    /// The token exists but belongs to a different resource.
    TokenInvalidResource,
    /// The token has expired.
    TokenExpired,
    /// The token has reached its usage limit.
    TokenUsedLimitReached,
    /// The token was revoked.
    TokenRevoked,
    /// The token validated but recording its usage failed.
    TokenUsageError,
    /// No rule granted access.
    RestrictedDefault,
}

impl DenyReason {
    /// The stable slug appended to denial redirects.
    pub fn slug(self) -> &'static str {
        match self {
            Self::InvalidPath => "invalid_path",
            Self::UnmanagedRestricted => "unmanaged_restricted",
            Self::GlobalUserDeny => "global_user_deny",
            Self::ResourceUserDeny => "resource_user_deny",
            Self::GlobalRoleDeny => "global_role_deny",
            Self::ResourceRoleDeny => "resource_role_deny",
            Self::TokenNotFound => "token_not_found",
            Self::TokenInvalidResource => "token_invalid_resource",
            Self::TokenExpired => "token_expired",
            Self::TokenUsedLimitReached => "token_used_limit_reached",
            Self::TokenRevoked => "token_revoked",
            Self::TokenUsageError => "token_usage_error",
            Self::RestrictedDefault => "restricted_default",
        }
    }
}
