//! The cache seam shared by the DNS and settings read paths.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// A key-value cache where every entry carries its own lifetime.
///
/// Callers store pre-serialized strings and pick a TTL per `set` —
/// the verifier keeps failed DNS lookups on a much shorter leash than
/// successful ones, so a single backend-wide TTL is not enough. Once
/// an entry's lifetime has passed it must behave exactly like a miss:
/// `get` returns `None` and the backend drops the stale value.
///
/// Implementations are process-local today; the trait exists so a
/// shared backend can replace the in-memory one without touching the
/// read paths.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Look up a live entry. Absent and expired are indistinguishable.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store an entry that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Drop an entry before its lifetime ends.
    async fn delete(&self, key: &str) -> AppResult<()>;
}
