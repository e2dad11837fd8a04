//! Minimal session authenticator.
//!
//! Resolves the requesting principal from the signed identity cookie
//! using only the identity store — no host framework involved. Every
//! failure path yields "no principal" so callers fall through to the
//! crawler and token checks instead of erroring the request.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use mediagate_core::config::auth::AuthConfig;
use mediagate_core::result::AppResult;
use mediagate_core::types::Principal;
use mediagate_database::repositories::account::AccountRepository;
use mediagate_entity::account::Account;

use super::cookie::AuthCookie;
use super::signature;

/// Read access to identity-store accounts.
///
/// Abstracted so the authenticator can be exercised against fixture
/// accounts without a database.
#[async_trait]
pub trait AccountSource: Send + Sync + std::fmt::Debug + 'static {
    /// Find an account by login name.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>>;
}

#[async_trait]
impl AccountSource for AccountRepository {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        AccountRepository::find_by_username(self, username).await
    }
}

/// Validates identity cookies into principals.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    accounts: Arc<dyn AccountSource>,
    config: AuthConfig,
}

impl SessionAuthenticator {
    /// Create a new session authenticator.
    pub fn new(accounts: Arc<dyn AccountSource>, config: AuthConfig) -> Self {
        Self { accounts, config }
    }

    /// Resolve a principal from a raw cookie value.
    ///
    /// Returns `None` — anonymous — for every malformed, stale,
    /// unknown, or tampered cookie.
    pub async fn authenticate(&self, raw_cookie: &str) -> Option<Principal> {
        let cookie = AuthCookie::parse(raw_cookie)?;
        let now = Utc::now();

        if cookie.expiration <= now.timestamp() {
            debug!(username = %cookie.username, "Identity cookie expired");
            return None;
        }

        let account = match self.accounts.find_by_username(&cookie.username).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                debug!(username = %cookie.username, "No account for cookie username");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Account lookup failed during authentication");
                return None;
            }
        };

        let fragment = signature::credential_fragment(&account.credential_hash);
        let key = signature::derive_signing_key(
            &self.config.secret_key,
            &cookie.username,
            fragment,
            cookie.expiration,
            &cookie.token,
        );
        let expected =
            signature::expected_signature(&key, &cookie.username, cookie.expiration, &cookie.token);

        if !signature::signatures_match(&expected, &cookie.signature) {
            debug!(username = %cookie.username, "Cookie signature mismatch");
            return None;
        }

        let verifier = signature::session_verifier(&cookie.token);
        if account.valid_session(&verifier, now).is_none() {
            debug!(username = %cookie.username, "No live session for cookie token");
            return None;
        }

        Some(Principal {
            id: account.id,
            roles: account.roles(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use sqlx::types::Json;

    use mediagate_entity::account::SessionEntry;

    use super::super::signature::{compose_cookie, session_verifier};
    use super::*;

    const SECRET: &str = "unit-test-secret";
    const HASH: &str = "$2y$10$abcdefghijklmnopqrstuv";

    /// Fixture store with a single account.
    #[derive(Debug)]
    struct FixtureAccounts {
        account: Account,
    }

    #[async_trait]
    impl AccountSource for FixtureAccounts {
        async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
            Ok((self.account.username == username).then(|| self.account.clone()))
        }
    }

    fn fixture(session_token: &str, session_expiration: i64) -> (SessionAuthenticator, i64) {
        let expiration = Utc::now().timestamp() + 3600;

        let mut capabilities = HashMap::new();
        capabilities.insert("editor".to_string(), true);
        capabilities.insert("subscriber".to_string(), false);

        let mut registry = HashMap::new();
        registry.insert(
            session_verifier(session_token),
            SessionEntry {
                expiration: session_expiration,
            },
        );

        let account = Account {
            id: 42,
            username: "alice".to_string(),
            credential_hash: HASH.to_string(),
            capabilities: Json(capabilities),
            session_registry: Json(registry),
            created_at: Utc::now(),
        };

        let authenticator = SessionAuthenticator::new(
            Arc::new(FixtureAccounts { account }),
            AuthConfig {
                secret_key: SECRET.to_string(),
                cookie_name: "mg_session".to_string(),
            },
        );
        (authenticator, expiration)
    }

    #[tokio::test]
    async fn accepts_genuine_cookie() {
        let (auth, expiration) = fixture("tok-1", Utc::now().timestamp() + 3600);
        let cookie = compose_cookie(SECRET, "alice", HASH, expiration, "tok-1");

        let principal = auth.authenticate(&cookie).await.unwrap();
        assert_eq!(principal.id, 42);
        assert_eq!(principal.roles, vec!["editor".to_string()]);
    }

    #[tokio::test]
    async fn rejects_tampered_signature() {
        let (auth, expiration) = fixture("tok-1", Utc::now().timestamp() + 3600);
        let cookie = compose_cookie(SECRET, "alice", HASH, expiration, "tok-1");
        let tampered = format!("{}x", &cookie[..cookie.len() - 1]);

        assert!(auth.authenticate(&tampered).await.is_none());
    }

    #[tokio::test]
    async fn rejects_expired_cookie() {
        let (auth, _) = fixture("tok-1", Utc::now().timestamp() + 3600);
        let past = Utc::now().timestamp() - 10;
        let cookie = compose_cookie(SECRET, "alice", HASH, past, "tok-1");

        assert!(auth.authenticate(&cookie).await.is_none());
    }

    #[tokio::test]
    async fn rejects_unknown_account() {
        let (auth, expiration) = fixture("tok-1", Utc::now().timestamp() + 3600);
        let cookie = compose_cookie(SECRET, "mallory", HASH, expiration, "tok-1");

        assert!(auth.authenticate(&cookie).await.is_none());
    }

    #[tokio::test]
    async fn rejects_session_missing_from_registry() {
        let (auth, expiration) = fixture("tok-1", Utc::now().timestamp() + 3600);
        // Correctly signed, but for a token the registry never saw.
        let cookie = compose_cookie(SECRET, "alice", HASH, expiration, "tok-other");

        assert!(auth.authenticate(&cookie).await.is_none());
    }

    #[tokio::test]
    async fn rejects_expired_session_entry() {
        let (auth, expiration) = fixture("tok-1", Utc::now().timestamp() - 10);
        let cookie = compose_cookie(SECRET, "alice", HASH, expiration, "tok-1");

        assert!(auth.authenticate(&cookie).await.is_none());
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let (auth, _) = fixture("tok-1", Utc::now().timestamp() + 3600);
        assert!(auth.authenticate("not-a-cookie").await.is_none());
        assert!(auth.authenticate("a|b|c|d|e").await.is_none());
    }
}
