//! Account entity model.
//!
//! Accounts belong to the external identity store. The access core
//! reads them to validate identity cookies and resolve roles; it never
//! writes them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// One entry in an account's session registry.
///
/// The registry maps a hashed session-token verifier to the session's
/// own expiration. Extra host-managed fields on the record are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    /// Epoch seconds after which the session is invalid.
    pub expiration: i64,
}

/// An identity-store account row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Numeric account id.
    pub id: i64,
    /// Login name, unique.
    pub username: String,
    /// Stored credential hash; a short fragment of it feeds the
    /// cookie-signing key derivation.
    pub credential_hash: String,
    /// Capability map: role name to enabled flag.
    pub capabilities: Json<HashMap<String, bool>>,
    /// Session registry: hashed session-token verifier to session record.
    pub session_registry: Json<HashMap<String, SessionEntry>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Role names with a truthy capability flag.
    pub fn roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = self
            .capabilities
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.clone())
            .collect();
        roles.sort();
        roles
    }

    /// Look up a session registry entry that is still valid at `now`.
    pub fn valid_session(&self, verifier: &str, now: DateTime<Utc>) -> Option<&SessionEntry> {
        self.session_registry
            .get(verifier)
            .filter(|entry| entry.expiration > now.timestamp())
    }
}
