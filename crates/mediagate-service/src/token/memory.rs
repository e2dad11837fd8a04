//! In-memory token store.
//!
//! Backs tests and embedded use. Atomicity comes from dashmap's
//! per-shard locking: every conditional mutation happens under the
//! entry's write guard, so racing consumers see the same
//! check-then-update the SQL store expresses in one statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use mediagate_core::error::AppError;
use mediagate_core::result::AppResult;
use mediagate_entity::token::{AccessToken, TokenDraft, TokenStatus};

use super::store::TokenStore;

/// Token store held entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: DashMap<String, AccessToken>,
}

impl InMemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, draft: &TokenDraft) -> AppResult<()> {
        match self.tokens.entry(draft.value.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(AppError::conflict("Token value already exists"))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(draft.clone().into_token());
                Ok(())
            }
        }
    }

    async fn find_by_value(&self, value: &str) -> AppResult<Option<AccessToken>> {
        Ok(self.tokens.get(value).map(|entry| entry.clone()))
    }

    async fn find_by_resource(&self, resource_id: Uuid) -> AppResult<Vec<AccessToken>> {
        let mut tokens: Vec<AccessToken> = self
            .tokens
            .iter()
            .filter(|entry| entry.resource_id == resource_id)
            .map(|entry| entry.clone())
            .collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tokens)
    }

    async fn consume(&self, value: &str) -> AppResult<bool> {
        let Some(mut entry) = self.tokens.get_mut(value) else {
            return Ok(false);
        };
        let token = entry.value_mut();

        if token.status != TokenStatus::Active {
            return Ok(false);
        }
        if token.max_uses > 0 && token.use_count >= token.max_uses {
            return Ok(false);
        }

        token.use_count += 1;
        token.last_used_at = Some(Utc::now());
        if token.max_uses > 0 && token.use_count >= token.max_uses {
            token.status = TokenStatus::Used;
        }
        Ok(true)
    }

    async fn set_status_if(
        &self,
        value: &str,
        from: TokenStatus,
        to: TokenStatus,
    ) -> AppResult<bool> {
        let Some(mut entry) = self.tokens.get_mut(value) else {
            return Ok(false);
        };
        let token = entry.value_mut();
        if token.status != from {
            return Ok(false);
        }
        token.status = to;
        Ok(true)
    }

    async fn reinstate(&self, value: &str, expires_at: Option<DateTime<Utc>>) -> AppResult<bool> {
        let Some(mut entry) = self.tokens.get_mut(value) else {
            return Ok(false);
        };
        let token = entry.value_mut();
        if !matches!(token.status, TokenStatus::Expired | TokenStatus::Revoked) {
            return Ok(false);
        }
        token.status = TokenStatus::Active;
        token.expires_at = expires_at;
        Ok(true)
    }

    async fn update_max_uses(&self, value: &str, new_max: i32) -> AppResult<bool> {
        let Some(mut entry) = self.tokens.get_mut(value) else {
            return Ok(false);
        };
        let token = entry.value_mut();
        if new_max != 0 && token.use_count > new_max {
            return Ok(false);
        }
        token.max_uses = new_max;
        Ok(true)
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut transitioned = 0u64;
        for mut entry in self.tokens.iter_mut() {
            let token = entry.value_mut();
            if token.status == TokenStatus::Active
                && matches!(token.expires_at, Some(at) if at < now)
            {
                token.status = TokenStatus::Expired;
                transitioned += 1;
            }
        }
        Ok(transitioned)
    }

    async fn delete_aged(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let before = self.tokens.len() as u64;
        self.tokens
            .retain(|_, token| token.status == TokenStatus::Active || token.created_at >= cutoff);
        Ok(before - self.tokens.len() as u64)
    }

    async fn delete(&self, value: &str) -> AppResult<bool> {
        Ok(self.tokens.remove(value).is_some())
    }
}
