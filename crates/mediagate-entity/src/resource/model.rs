//! Resource entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// Per-resource override of the global crawler policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bot_access", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BotAccess {
    /// Use the global allow-bots setting.
    Inherit,
    /// Always let verified crawlers through for this resource.
    Allow,
    /// Never let crawlers through for this resource.
    Deny,
}

/// A protected file entry under the shared upload tree.
///
/// Resources are owned by the metadata write path; the access core
/// reads them and never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resource {
    /// Stable identifier.
    pub id: Uuid,
    /// Uploads-relative path, unique across the tree.
    pub path: String,
    /// Whether access rules apply. Unprotected resources are served
    /// directly without consulting the evaluator.
    pub is_protected: bool,
    /// Denial redirect override for this resource.
    pub redirect_url: Option<String>,
    /// Crawler policy override.
    pub bot_access: BotAccess,
    /// Account ids always granted access to this resource.
    pub user_allow_list: Json<Vec<i64>>,
    /// Account ids always denied access to this resource.
    pub user_deny_list: Json<Vec<i64>>,
    /// Role names granted access to this resource.
    pub role_allow_list: Json<Vec<String>>,
    /// Role names denied access to this resource.
    pub role_deny_list: Json<Vec<String>>,
    /// Token lifetime override in seconds; `None` falls back to the
    /// global default, `<= 0` means tokens never expire.
    pub token_expiry_override: Option<i64>,
    /// Token use-limit override; `None` falls back to the global
    /// default, `0` means unlimited.
    pub token_max_uses_override: Option<i32>,
    /// When the resource record was created.
    pub created_at: DateTime<Utc>,
    /// When the resource record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// File name component of the resource path.
    pub fn filename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}
