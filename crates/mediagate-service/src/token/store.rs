//! Storage seam for token state.
//!
//! The service layer speaks to token storage through this trait. The
//! Postgres-backed [`TokenRepository`] is the production
//! implementation; [`super::memory::InMemoryTokenStore`] backs tests
//! and embedded use. Implementations must make `consume`,
//! `set_status_if`, `reinstate`, and `update_max_uses` atomic with
//! respect to concurrent callers on the same token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use mediagate_core::result::AppResult;
use mediagate_database::repositories::token::TokenRepository;
use mediagate_entity::token::{AccessToken, TokenDraft, TokenStatus};

/// Persistence operations for access tokens.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a freshly generated token; `Conflict` on duplicate value.
    async fn insert(&self, draft: &TokenDraft) -> AppResult<()>;

    /// Find a token by its value.
    async fn find_by_value(&self, value: &str) -> AppResult<Option<AccessToken>>;

    /// List all tokens for a resource, newest first.
    async fn find_by_resource(&self, resource_id: Uuid) -> AppResult<Vec<AccessToken>>;

    /// Atomically record one use of an active token. `false` when the
    /// token was not active or already at its limit.
    async fn consume(&self, value: &str) -> AppResult<bool>;

    /// Atomically move a token from one status to another. `false`
    /// when the token was not in `from`.
    async fn set_status_if(
        &self,
        value: &str,
        from: TokenStatus,
        to: TokenStatus,
    ) -> AppResult<bool>;

    /// Atomically reactivate an expired or revoked token with a new
    /// expiry. `false` when the token was in any other status.
    async fn reinstate(&self, value: &str, expires_at: Option<DateTime<Utc>>) -> AppResult<bool>;

    /// Change the use limit, refusing to drop below the recorded use
    /// count. `false` when the guard failed.
    async fn update_max_uses(&self, value: &str, new_max: i32) -> AppResult<bool>;

    /// Bulk-transition active tokens past their expiry. Returns the
    /// number of rows transitioned.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Delete non-active tokens created before the cutoff. Returns the
    /// number of rows removed.
    async fn delete_aged(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;

    /// Delete a token by value. `true` if a row was removed.
    async fn delete(&self, value: &str) -> AppResult<bool>;
}

#[async_trait]
impl TokenStore for TokenRepository {
    async fn insert(&self, draft: &TokenDraft) -> AppResult<()> {
        TokenRepository::insert(self, draft).await
    }

    async fn find_by_value(&self, value: &str) -> AppResult<Option<AccessToken>> {
        TokenRepository::find_by_value(self, value).await
    }

    async fn find_by_resource(&self, resource_id: Uuid) -> AppResult<Vec<AccessToken>> {
        TokenRepository::find_by_resource(self, resource_id).await
    }

    async fn consume(&self, value: &str) -> AppResult<bool> {
        TokenRepository::consume(self, value).await
    }

    async fn set_status_if(
        &self,
        value: &str,
        from: TokenStatus,
        to: TokenStatus,
    ) -> AppResult<bool> {
        TokenRepository::set_status_if(self, value, from, to).await
    }

    async fn reinstate(&self, value: &str, expires_at: Option<DateTime<Utc>>) -> AppResult<bool> {
        TokenRepository::reinstate(self, value, expires_at).await
    }

    async fn update_max_uses(&self, value: &str, new_max: i32) -> AppResult<bool> {
        TokenRepository::update_max_uses(self, value, new_max).await
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        TokenRepository::expire_overdue(self, now).await
    }

    async fn delete_aged(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        TokenRepository::delete_aged(self, cutoff).await
    }

    async fn delete(&self, value: &str) -> AppResult<bool> {
        TokenRepository::delete(self, value).await
    }
}
