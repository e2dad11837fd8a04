//! Runtime settings repository implementation.
//!
//! A plain key-to-JSON table. Typed access with defaults lives in the
//! service layer; this repository only moves raw values.

use sqlx::PgPool;

use mediagate_core::error::{AppError, ErrorKind};
use mediagate_core::result::AppResult;

/// Repository for the `settings` key-value table.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a raw setting value.
    pub async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT value FROM settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to read setting", e)
                })?;
        Ok(row.map(|(value,)| value))
    }

    /// Upsert a setting value.
    pub async fn set(&self, key: &str, value: &serde_json::Value) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to write setting", e))?;
        Ok(())
    }

    /// Delete a setting. Returns `true` if a row was removed.
    pub async fn delete(&self, key: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete setting", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
