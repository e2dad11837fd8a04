//! Token lifecycle service.
//!
//! Generation resolves expiry and use limits through a fixed
//! precedence (explicit override, then resource override, then global
//! default); validation is a pure read; consumption and every status
//! transition delegate to one atomic store operation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use mediagate_core::error::AppError;
use mediagate_core::result::AppResult;
use mediagate_entity::resource::Resource;
use mediagate_entity::token::{AccessToken, TokenDraft, TokenStatus, TokenValidation};

use super::store::TokenStore;

/// Length of generated token values.
const TOKEN_VALUE_LENGTH: usize = 40;

/// Global token defaults from the settings store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenDefaults {
    /// Default lifetime in seconds; `<= 0` means tokens never expire.
    pub expiry_seconds: i64,
    /// Default use limit; `0` means unlimited.
    pub max_uses: i32,
}

/// Caller-supplied parameters for one token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenOverrides {
    /// Explicit absolute expiry. Takes top precedence when strictly in
    /// the future; a stale value is discarded.
    pub expires_at: Option<DateTime<Utc>>,
    /// Explicit relative lifetime in seconds; `<= 0` means never expires.
    pub expires_in_seconds: Option<i64>,
    /// Explicit use limit; `0` means unlimited.
    pub max_uses: Option<i32>,
    /// Account the token is issued to.
    pub owner_id: Option<i64>,
    /// Email the token is issued to.
    pub owner_email: Option<String>,
    /// IP the token is issued from.
    pub owner_ip: Option<String>,
}

/// Expiry and use-limit resolution for one resource.
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    /// Resource-level lifetime override in seconds.
    pub expiry_override: Option<i64>,
    /// Resource-level use-limit override.
    pub max_uses_override: Option<i32>,
    /// Global defaults.
    pub defaults: TokenDefaults,
}

impl TokenPolicy {
    /// Build the policy for a resource.
    pub fn for_resource(resource: &Resource, defaults: TokenDefaults) -> Self {
        Self {
            expiry_override: resource.token_expiry_override,
            max_uses_override: resource.token_max_uses_override,
            defaults,
        }
    }

    /// Policy with no resource overrides.
    pub fn from_defaults(defaults: TokenDefaults) -> Self {
        Self {
            expiry_override: None,
            max_uses_override: None,
            defaults,
        }
    }

    /// Resolve the expiry timestamp for a new or reinstated token.
    ///
    /// Precedence: explicit absolute (future only) > explicit relative
    /// seconds > resource override > global default. A non-positive
    /// resolved lifetime yields `None` — the token never expires.
    pub fn resolve_expiry(
        &self,
        overrides: &TokenOverrides,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if let Some(at) = overrides.expires_at {
            if at > now {
                return Some(at);
            }
        }

        let seconds = overrides
            .expires_in_seconds
            .or(self.expiry_override)
            .unwrap_or(self.defaults.expiry_seconds);

        (seconds > 0).then(|| now + Duration::seconds(seconds))
    }

    /// Resolve the use limit: explicit > resource override > default.
    pub fn resolve_max_uses(&self, overrides: &TokenOverrides) -> i32 {
        overrides
            .max_uses
            .or(self.max_uses_override)
            .unwrap_or(self.defaults.max_uses)
            .max(0)
    }
}

/// A stored token together with its composed access URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// The token value.
    pub value: String,
    /// Full tokenized URL for the resource.
    pub url: String,
    /// Resolved expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Resolved use limit.
    pub max_uses: i32,
}

/// Cleanup behaviour from the settings store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CleanupOptions {
    /// Whether aged non-active tokens are deleted at all.
    pub delete_enabled: bool,
    /// Minimum age in months before a non-active token is deleted.
    pub delete_age_months: i32,
}

/// What a cleanup sweep did.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Active tokens transitioned to expired.
    pub expired: u64,
    /// Aged non-active tokens deleted.
    pub deleted: u64,
}

/// Generates, validates, consumes, and administers access tokens.
#[derive(Debug, Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
}

impl TokenService {
    /// Create a new token service over a store.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Generate a draft token for a resource.
    pub fn generate(
        &self,
        resource_id: Uuid,
        policy: &TokenPolicy,
        overrides: &TokenOverrides,
    ) -> TokenDraft {
        let now = Utc::now();
        TokenDraft {
            value: generate_value(),
            resource_id,
            owner_id: overrides.owner_id,
            owner_email: overrides.owner_email.clone(),
            owner_ip: overrides.owner_ip.clone(),
            created_at: now,
            expires_at: policy.resolve_expiry(overrides, now),
            max_uses: policy.resolve_max_uses(overrides),
        }
    }

    /// Persist a draft. Returns the token value.
    ///
    /// A duplicate value is a `Conflict` failure; this layer does not
    /// regenerate and retry on the caller's behalf.
    pub async fn store(&self, draft: &TokenDraft) -> AppResult<String> {
        self.store.insert(draft).await?;
        Ok(draft.value.clone())
    }

    /// Generate, persist, and compose the tokenized access URL.
    pub async fn issue(
        &self,
        resource: &Resource,
        defaults: TokenDefaults,
        overrides: &TokenOverrides,
        base_url: &str,
    ) -> AppResult<IssuedToken> {
        let policy = TokenPolicy::for_resource(resource, defaults);
        let draft = self.generate(resource.id, &policy, overrides);
        let value = self.store(&draft).await?;

        info!(resource_id = %resource.id, "Issued access token");
        Ok(IssuedToken {
            url: compose_access_url(base_url, &resource.path, &value),
            value,
            expires_at: draft.expires_at,
            max_uses: draft.max_uses,
        })
    }

    /// Check a presented token against a resource without mutating it.
    ///
    /// A stale-but-active row reports `Expired`; persisting that
    /// transition is the caller's job (see
    /// [`TokenService::persist_lazy_transition`]).
    pub async fn validate(&self, value: &str, resource_id: Uuid) -> AppResult<TokenValidation> {
        let Some(token) = self.store.find_by_value(value).await? else {
            return Ok(TokenValidation::NotFound);
        };

        if token.resource_id != resource_id {
            return Ok(TokenValidation::InvalidResource);
        }

        match token.status {
            TokenStatus::Expired => Ok(TokenValidation::Expired),
            TokenStatus::Used => Ok(TokenValidation::UsedLimitReached),
            TokenStatus::Revoked => Ok(TokenValidation::Revoked),
            TokenStatus::Active => {
                if token.is_past_expiry(Utc::now()) {
                    Ok(TokenValidation::Expired)
                } else if token.is_exhausted() {
                    Ok(TokenValidation::UsedLimitReached)
                } else {
                    Ok(TokenValidation::Valid)
                }
            }
        }
    }

    /// Record one use. `false` when the token lost a race or was not
    /// active.
    pub async fn consume(&self, value: &str) -> AppResult<bool> {
        self.store.consume(value).await
    }

    /// Persist the status a validation reported for a still-active row.
    ///
    /// No-op for outcomes that do not imply a transition, or when
    /// another caller already moved the token out of `active`.
    pub async fn persist_lazy_transition(
        &self,
        value: &str,
        validation: TokenValidation,
    ) -> AppResult<()> {
        match validation {
            TokenValidation::Expired => {
                self.store
                    .set_status_if(value, TokenStatus::Active, TokenStatus::Expired)
                    .await?;
            }
            TokenValidation::UsedLimitReached => {
                self.store
                    .set_status_if(value, TokenStatus::Active, TokenStatus::Used)
                    .await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Revoke an active token. `false` when it was not active.
    pub async fn revoke(&self, value: &str) -> AppResult<bool> {
        self.store
            .set_status_if(value, TokenStatus::Active, TokenStatus::Revoked)
            .await
    }

    /// Return an expired or revoked token to service with a fresh
    /// expiry resolved through the same precedence as generation.
    pub async fn reinstate(
        &self,
        value: &str,
        policy: &TokenPolicy,
        overrides: &TokenOverrides,
    ) -> AppResult<()> {
        let now = Utc::now();
        if let Some(at) = overrides.expires_at {
            if at <= now {
                return Err(AppError::validation(
                    "Reinstatement expiry must be in the future",
                ));
            }
        }

        let Some(token) = self.store.find_by_value(value).await? else {
            return Err(AppError::not_found("Token not found"));
        };
        if !matches!(token.status, TokenStatus::Expired | TokenStatus::Revoked) {
            return Err(AppError::conflict(
                "Only expired or revoked tokens can be reinstated",
            ));
        }

        let expires_at = policy.resolve_expiry(overrides, now);
        if !self.store.reinstate(value, expires_at).await? {
            return Err(AppError::conflict("Token changed status concurrently"));
        }

        info!(token = %redact(value), "Reinstated access token");
        Ok(())
    }

    /// Change a token's use limit.
    ///
    /// Rejects limits below the recorded use count and limits above a
    /// non-zero resource-level cap.
    pub async fn update_max_uses(
        &self,
        value: &str,
        new_max: i32,
        resource_cap: Option<i32>,
    ) -> AppResult<()> {
        if new_max < 0 {
            return Err(AppError::validation("Use limit must be non-negative"));
        }

        let Some(token) = self.store.find_by_value(value).await? else {
            return Err(AppError::not_found("Token not found"));
        };
        if new_max != 0 && new_max < token.use_count {
            return Err(AppError::validation(
                "Use limit cannot drop below the recorded use count",
            ));
        }
        if let Some(cap) = resource_cap {
            if cap > 0 && (new_max == 0 || new_max > cap) {
                return Err(AppError::validation(
                    "Use limit exceeds the resource's token limit",
                ));
            }
        }

        if !self.store.update_max_uses(value, new_max).await? {
            return Err(AppError::conflict("Token was consumed past the new limit"));
        }
        Ok(())
    }

    /// Sweep the token table: lazily expire overdue active tokens and,
    /// when enabled, delete non-active tokens past the age threshold.
    pub async fn cleanup(&self, options: &CleanupOptions) -> AppResult<CleanupReport> {
        let now = Utc::now();
        let expired = self.store.expire_overdue(now).await?;

        let mut deleted = 0;
        if options.delete_enabled && options.delete_age_months > 0 {
            if let Some(cutoff) = now.checked_sub_months(Months::new(options.delete_age_months as u32))
            {
                deleted = self.store.delete_aged(cutoff).await?;
            }
        }

        info!(expired, deleted, "Token cleanup sweep finished");
        Ok(CleanupReport { expired, deleted })
    }

    /// Fetch a token by value.
    pub async fn get(&self, value: &str) -> AppResult<Option<AccessToken>> {
        self.store.find_by_value(value).await
    }

    /// List all tokens for a resource.
    pub async fn list_for_resource(&self, resource_id: Uuid) -> AppResult<Vec<AccessToken>> {
        self.store.find_by_resource(resource_id).await
    }

    /// Delete a token by value. `true` if a row was removed.
    pub async fn delete(&self, value: &str) -> AppResult<bool> {
        self.store.delete(value).await
    }
}

/// Generate a fresh high-entropy token value.
fn generate_value() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_VALUE_LENGTH)
        .map(char::from)
        .collect()
}

/// Compose the tokenized URL for a resource path.
fn compose_access_url(base_url: &str, path: &str, value: &str) -> String {
    format!(
        "{}/{}?access_token={}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/'),
        value
    )
}

/// Token values are secrets; logs carry only a prefix.
fn redact(value: &str) -> String {
    let prefix: String = value.chars().take(6).collect();
    format!("{prefix}…")
}
