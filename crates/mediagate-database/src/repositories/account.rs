//! Identity-store account repository implementation.
//!
//! Read-only: the access core validates cookies and resolves roles but
//! never writes to the identity store.

use sqlx::PgPool;

use mediagate_core::error::{AppError, ErrorKind};
use mediagate_core::result::AppResult;
use mediagate_entity::account::Account;

/// Repository for account lookups.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new account repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an account by login name.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find account", e)
            })
    }
}
