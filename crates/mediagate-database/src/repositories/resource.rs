//! Resource repository implementation.
//!
//! Resources are read-only from the access core's perspective; their
//! write path belongs to the metadata administration layer.

use sqlx::PgPool;
use uuid::Uuid;

use mediagate_core::error::{AppError, ErrorKind};
use mediagate_core::result::AppResult;
use mediagate_entity::resource::Resource;

/// Repository for resource lookups.
#[derive(Debug, Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    /// Create a new resource repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a resource by its uploads-relative path.
    pub async fn find_by_path(&self, path: &str) -> AppResult<Option<Resource>> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE path = $1")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find resource by path", e)
            })
    }

    /// Find a resource by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Resource>> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find resource", e))
    }
}
