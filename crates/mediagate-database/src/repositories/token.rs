//! Access token repository implementation.
//!
//! Every state transition here is a single conditional UPDATE so that
//! concurrent callers cannot interleave a read-modify-write on the
//! same token row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use mediagate_core::error::{AppError, ErrorKind};
use mediagate_core::result::AppResult;
use mediagate_entity::token::{AccessToken, TokenDraft, TokenStatus};

/// Repository for token CRUD and state-transition operations.
#[derive(Debug, Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    /// Create a new token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a freshly generated token.
    ///
    /// A unique-constraint violation on the token value surfaces as a
    /// `Conflict` error; retrying with a new value is the caller's call.
    pub async fn insert(&self, draft: &TokenDraft) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO access_tokens \
             (value, resource_id, owner_id, owner_email, owner_ip, created_at, expires_at, use_count, max_uses, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, 'active')",
        )
        .bind(&draft.value)
        .bind(draft.resource_id)
        .bind(draft.owner_id)
        .bind(&draft.owner_email)
        .bind(&draft.owner_ip)
        .bind(draft.created_at)
        .bind(draft.expires_at)
        .bind(draft.max_uses)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("Token value already exists")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to insert token", e),
        })?;
        Ok(())
    }

    /// Find a token by its value.
    pub async fn find_by_value(&self, value: &str) -> AppResult<Option<AccessToken>> {
        sqlx::query_as::<_, AccessToken>("SELECT * FROM access_tokens WHERE value = $1")
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find token", e))
    }

    /// List all tokens for a resource, newest first.
    pub async fn find_by_resource(&self, resource_id: Uuid) -> AppResult<Vec<AccessToken>> {
        sqlx::query_as::<_, AccessToken>(
            "SELECT * FROM access_tokens WHERE resource_id = $1 ORDER BY created_at DESC",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list tokens for resource", e)
        })
    }

    /// Record one use of an active token.
    ///
    /// Increments `use_count`, stamps `last_used_at`, and flips the
    /// status to `used` when the increment reaches a non-zero
    /// `max_uses` — all in one statement, guarded so the counter can
    /// never pass the limit no matter how many consumers race.
    ///
    /// Returns `false` when the token was not active or already at its
    /// limit (including losing such a race).
    pub async fn consume(&self, value: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE access_tokens \
             SET use_count = use_count + 1, \
                 last_used_at = NOW(), \
                 status = CASE WHEN max_uses > 0 AND use_count + 1 >= max_uses \
                               THEN 'used'::token_status ELSE status END \
             WHERE value = $1 \
               AND status = 'active' \
               AND (max_uses = 0 OR use_count < max_uses)",
        )
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to consume token", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Move a token from one status to another.
    ///
    /// Returns `false` when the token was not in `from` (another caller
    /// may have transitioned it first).
    pub async fn set_status_if(
        &self,
        value: &str,
        from: TokenStatus,
        to: TokenStatus,
    ) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE access_tokens SET status = $3 WHERE value = $1 AND status = $2")
                .bind(value)
                .bind(from)
                .bind(to)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to update token status", e)
                })?;
        Ok(result.rows_affected() > 0)
    }

    /// Return an expired or revoked token to service.
    ///
    /// Status and expiry change together in one statement; a token is
    /// never reactivated while keeping its stale expiry.
    pub async fn reinstate(
        &self,
        value: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE access_tokens SET status = 'active', expires_at = $2 \
             WHERE value = $1 AND status IN ('expired', 'revoked')",
        )
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reinstate token", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Change a token's use limit.
    ///
    /// The statement refuses to lower the limit below the recorded use
    /// count; `0` (unlimited) is always accepted.
    pub async fn update_max_uses(&self, value: &str, new_max: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE access_tokens SET max_uses = $2 \
             WHERE value = $1 AND ($2 = 0 OR use_count <= $2)",
        )
        .bind(value)
        .bind(new_max)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update token max uses", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Bulk-transition active tokens whose expiry has passed.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE access_tokens SET status = 'expired' \
             WHERE status = 'active' AND expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to expire overdue tokens", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Delete non-active tokens created before the cutoff.
    pub async fn delete_aged(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM access_tokens WHERE status != 'active' AND created_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete aged tokens", e))?;
        Ok(result.rows_affected())
    }

    /// Delete a token by value. Returns `true` if a row was removed.
    pub async fn delete(&self, value: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE value = $1")
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete token", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
