//! Request gateway.
//!
//! Sequences one access decision end to end: path validation, resource
//! lookup, the rule evaluator over the session principal, then the
//! crawler and token fallbacks, and finally delivery planning or the
//! denial redirect. Expected conditions never error out of here; only
//! infrastructure failures (database, configuration) propagate, and
//! the API layer turns those into a generic server error.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use mediagate_auth::bot::BotVerifier;
use mediagate_auth::session::SessionAuthenticator;
use mediagate_core::config::delivery::DeliveryConfig;
use mediagate_core::config::uploads::UploadsConfig;
use mediagate_core::result::AppResult;
use mediagate_core::types::{AccessReason, DenyReason, Principal};
use mediagate_database::repositories::resource::ResourceRepository;
use mediagate_entity::resource::{BotAccess, Resource};
use mediagate_entity::token::TokenValidation;

use crate::delivery::{self, DeliveryPlan};
use crate::rules::{self, RuleVerdict};
use crate::settings::{SettingsProvider, UnmanagedPolicy};
use crate::token::TokenService;

/// Read access to resource metadata.
#[async_trait]
pub trait ResourceSource: Send + Sync + std::fmt::Debug + 'static {
    /// Find a resource by its uploads-relative path.
    async fn find_by_path(&self, path: &str) -> AppResult<Option<Resource>>;
}

#[async_trait]
impl ResourceSource for ResourceRepository {
    async fn find_by_path(&self, path: &str) -> AppResult<Option<Resource>> {
        ResourceRepository::find_by_path(self, path).await
    }
}

/// Everything the gateway needs to know about one request.
#[derive(Debug, Clone, Default)]
pub struct AccessRequest {
    /// Requested path relative to the upload tree, as received.
    pub path: String,
    /// Presented access token, if any.
    pub access_token: Option<String>,
    /// Raw identity cookie value, if present.
    pub cookie: Option<String>,
    /// The request's User-Agent header.
    pub user_agent: Option<String>,
    /// The requesting client address.
    pub ip: Option<std::net::IpAddr>,
}

/// The gateway's decision for one request.
#[derive(Debug, Clone)]
pub enum AccessOutcome {
    /// Serve the file according to the plan.
    Deliver(DeliveryPlan),
    /// Redirect to the fallback URL; the reason slug is already in the
    /// location's query string.
    Redirect {
        /// Fully composed redirect target.
        location: String,
        /// Why the request was denied.
        reason: DenyReason,
    },
}

/// Orchestrates the access decision pipeline.
#[derive(Debug, Clone)]
pub struct RequestGateway {
    resources: Arc<dyn ResourceSource>,
    settings: SettingsProvider,
    tokens: TokenService,
    sessions: SessionAuthenticator,
    bots: BotVerifier,
    uploads: UploadsConfig,
    delivery: DeliveryConfig,
}

impl RequestGateway {
    /// Create a gateway over its collaborators.
    pub fn new(
        resources: Arc<dyn ResourceSource>,
        settings: SettingsProvider,
        tokens: TokenService,
        sessions: SessionAuthenticator,
        bots: BotVerifier,
        uploads: UploadsConfig,
        delivery: DeliveryConfig,
    ) -> Self {
        Self {
            resources,
            settings,
            tokens,
            sessions,
            bots,
            uploads,
            delivery,
        }
    }

    /// Decide one request.
    pub async fn handle(&self, request: &AccessRequest) -> AppResult<AccessOutcome> {
        let Some(rel_path) = sanitize_path(&request.path) else {
            debug!(path = %request.path, "Rejected malformed media path");
            return self.deny(None, DenyReason::InvalidPath).await;
        };

        let file_path = Path::new(&self.uploads.root_dir).join(&rel_path);
        let is_file = tokio::fs::metadata(&file_path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return self.deny(None, DenyReason::InvalidPath).await;
        }

        let Some(resource) = self.resources.find_by_path(&rel_path).await? else {
            return match self.settings.unmanaged_policy().await? {
                UnmanagedPolicy::Serve => {
                    self.serve(&rel_path, &file_path, AccessReason::UnmanagedPublic)
                }
                UnmanagedPolicy::Deny => self.deny(None, DenyReason::UnmanagedRestricted).await,
            };
        };

        // Unprotected resources skip the evaluator entirely.
        if !resource.is_protected {
            return self.serve(&rel_path, &file_path, AccessReason::Unprotected);
        }

        let principal = match &request.cookie {
            Some(cookie) => self
                .sessions
                .authenticate(cookie)
                .await
                .unwrap_or_else(Principal::anonymous),
            None => Principal::anonymous(),
        };

        let lists = self.settings.access_lists().await?;
        match rules::evaluate(&principal, &resource, &lists) {
            RuleVerdict::Grant(reason) => self.serve(&rel_path, &file_path, reason),
            RuleVerdict::Deny(reason) => self.deny(Some(&resource), reason).await,
            RuleVerdict::Indeterminate => {
                if self.is_allowed_crawler(&resource, request).await? {
                    return self.serve(&rel_path, &file_path, AccessReason::VerifiedBot);
                }

                match &request.access_token {
                    Some(value) => self.try_token(value, &resource, &rel_path, &file_path).await,
                    None => self.deny(Some(&resource), DenyReason::RestrictedDefault).await,
                }
            }
        }
    }

    /// Whether a verified crawler may pass, honouring the resource's
    /// tri-state override of the global flag.
    async fn is_allowed_crawler(
        &self,
        resource: &Resource,
        request: &AccessRequest,
    ) -> AppResult<bool> {
        let allowed = match resource.bot_access {
            BotAccess::Allow => true,
            BotAccess::Deny => false,
            BotAccess::Inherit => self.settings.allow_bots().await?,
        };
        if !allowed {
            return Ok(false);
        }

        let (Some(user_agent), Some(ip)) = (&request.user_agent, request.ip) else {
            return Ok(false);
        };

        let policy = self.settings.bot_policy().await?;
        Ok(self.bots.is_verified_bot(user_agent, ip, &policy).await)
    }

    /// Validate and consume a presented token, persisting any lazy
    /// status transition the validation surfaced.
    async fn try_token(
        &self,
        value: &str,
        resource: &Resource,
        rel_path: &str,
        file_path: &Path,
    ) -> AppResult<AccessOutcome> {
        let validation = self.tokens.validate(value, resource.id).await?;
        match validation {
            TokenValidation::Valid => {
                if self.tokens.consume(value).await? {
                    self.serve(rel_path, file_path, AccessReason::Token)
                } else {
                    // Lost the consumption race after a valid read.
                    self.deny(Some(resource), DenyReason::TokenUsageError).await
                }
            }
            other => {
                self.tokens.persist_lazy_transition(value, other).await?;
                let reason = other.deny_reason().unwrap_or(DenyReason::RestrictedDefault);
                self.deny(Some(resource), reason).await
            }
        }
    }

    fn serve(
        &self,
        rel_path: &str,
        file_path: &Path,
        reason: AccessReason,
    ) -> AppResult<AccessOutcome> {
        debug!(path = rel_path, ?reason, "Granting media access");
        Ok(AccessOutcome::Deliver(delivery::plan(
            rel_path,
            file_path,
            reason,
            &self.delivery,
        )))
    }

    async fn deny(
        &self,
        resource: Option<&Resource>,
        reason: DenyReason,
    ) -> AppResult<AccessOutcome> {
        let default_redirect = self.settings.default_redirect_url().await?;
        let location = delivery::denial_location(
            resource.and_then(|r| r.redirect_url.as_deref()),
            default_redirect.as_deref(),
            &self.uploads.site_root(),
            reason,
        );
        debug!(?reason, "Denying media access");
        Ok(AccessOutcome::Redirect { location, reason })
    }
}

/// Normalize a request path into an uploads-relative path.
///
/// Rejects empty paths, dot and dot-dot segments, empty segments,
/// backslashes, and NUL, so the joined path can never climb out of
/// the upload root.
pub fn sanitize_path(raw: &str) -> Option<String> {
    if raw.contains('\\') || raw.contains('\0') {
        return None;
    }

    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    for segment in trimmed.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return None;
        }
    }

    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::IpAddr;
    use std::time::Duration;

    use chrono::Utc;
    use dashmap::DashMap;
    use sqlx::types::Json;
    use uuid::Uuid;

    use mediagate_auth::bot::resolver::DnsResolver;
    use mediagate_auth::session::authenticator::AccountSource;
    use mediagate_auth::session::signature::compose_cookie;
    use mediagate_cache::MemoryCacheProvider;
    use mediagate_core::config::auth::AuthConfig;
    use mediagate_core::config::cache::CacheConfig;
    use mediagate_core::error::AppError;
    use mediagate_entity::account::{Account, SessionEntry};

    use crate::delivery::Disposition;
    use crate::settings::InMemorySettings;
    use crate::token::{InMemoryTokenStore, TokenDefaults, TokenOverrides, TokenPolicy};

    use super::*;

    const SECRET: &str = "gateway-test-secret";
    const HASH: &str = "$2y$10$abcdefghijklmnopqrstuv";
    const BOT_UA: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    #[derive(Debug, Default)]
    struct FixtureResources {
        by_path: DashMap<String, Resource>,
    }

    impl FixtureResources {
        fn put(&self, resource: Resource) {
            self.by_path.insert(resource.path.clone(), resource);
        }
    }

    #[async_trait]
    impl ResourceSource for FixtureResources {
        async fn find_by_path(&self, path: &str) -> AppResult<Option<Resource>> {
            Ok(self.by_path.get(path).map(|entry| entry.clone()))
        }
    }

    #[derive(Debug, Default)]
    struct FixtureAccounts {
        accounts: HashMap<String, Account>,
    }

    #[async_trait]
    impl AccountSource for FixtureAccounts {
        async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
            Ok(self.accounts.get(username).cloned())
        }
    }

    /// Resolver that verifies exactly one crawler address.
    #[derive(Debug)]
    struct OneBotResolver {
        ip: IpAddr,
        hostname: String,
        forward_confirms: bool,
    }

    #[async_trait]
    impl DnsResolver for OneBotResolver {
        async fn reverse(&self, ip: IpAddr) -> AppResult<Option<String>> {
            if ip == self.ip {
                Ok(Some(self.hostname.clone()))
            } else {
                Err(AppError::external_service("no PTR record"))
            }
        }

        async fn forward(&self, hostname: &str) -> AppResult<Vec<IpAddr>> {
            if hostname == self.hostname && self.forward_confirms {
                Ok(vec![self.ip])
            } else {
                Ok(Vec::new())
            }
        }
    }

    struct Fixture {
        gateway: RequestGateway,
        resources: Arc<FixtureResources>,
        settings: Arc<InMemorySettings>,
        tokens: TokenService,
        root: std::path::PathBuf,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    fn fixture_with(accounts: FixtureAccounts, forward_confirms: bool) -> Fixture {
        let root = std::env::temp_dir().join(format!("mediagate-gw-{}", Uuid::new_v4()));
        std::fs::create_dir_all(root.join("2026")).unwrap();
        std::fs::write(root.join("2026/report.pdf"), b"%PDF-1.4 test").unwrap();
        std::fs::write(root.join("2026/loose.txt"), b"unmanaged").unwrap();

        let resources = Arc::new(FixtureResources::default());
        let settings_source = Arc::new(InMemorySettings::new());
        let cache = Arc::new(MemoryCacheProvider::new(&CacheConfig {
            default_ttl_seconds: 60,
            memory: Default::default(),
        }));
        let settings = SettingsProvider::new(
            settings_source.clone(),
            cache.clone(),
            Duration::from_secs(60),
        );
        let tokens = TokenService::new(Arc::new(InMemoryTokenStore::new()));
        let sessions = SessionAuthenticator::new(
            Arc::new(accounts),
            AuthConfig {
                secret_key: SECRET.to_string(),
                cookie_name: "mg_session".to_string(),
            },
        );
        let bot_ip: IpAddr = "66.249.66.1".parse().unwrap();
        let bots = BotVerifier::new(
            Arc::new(OneBotResolver {
                ip: bot_ip,
                hostname: "crawl-66-249-66-1.googlebot.com".to_string(),
                forward_confirms,
            }),
            cache,
        );
        let uploads = UploadsConfig {
            root_dir: root.to_string_lossy().into_owned(),
            base_url: "https://example.com/uploads".to_string(),
            site_url: "https://example.com".to_string(),
        };

        let gateway = RequestGateway::new(
            resources.clone(),
            settings.clone(),
            tokens.clone(),
            sessions,
            bots,
            uploads,
            DeliveryConfig::default(),
        );

        Fixture {
            gateway,
            resources,
            settings: settings_source,
            tokens,
            root,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(FixtureAccounts::default(), true)
    }

    fn protected_resource(path: &str) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            path: path.to_string(),
            is_protected: true,
            redirect_url: None,
            bot_access: BotAccess::Inherit,
            user_allow_list: Json(Vec::new()),
            user_deny_list: Json(Vec::new()),
            role_allow_list: Json(Vec::new()),
            role_deny_list: Json(Vec::new()),
            token_expiry_override: None,
            token_max_uses_override: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(path: &str) -> AccessRequest {
        AccessRequest {
            path: path.to_string(),
            ..Default::default()
        }
    }

    fn assert_redirect(outcome: AccessOutcome, expected: DenyReason) {
        match outcome {
            AccessOutcome::Redirect { location, reason } => {
                assert_eq!(reason, expected);
                assert!(location.contains(&format!("mg_error={}", expected.slug())));
            }
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn sanitize_accepts_plain_relative_paths() {
        assert_eq!(
            sanitize_path("/2026/report.pdf"),
            Some("2026/report.pdf".to_string())
        );
        assert_eq!(sanitize_path("a.txt"), Some("a.txt".to_string()));
    }

    #[test]
    fn sanitize_rejects_traversal_and_junk() {
        for raw in [
            "",
            "/",
            "../secret",
            "2026/../../etc/passwd",
            "2026/./a.txt",
            "2026//a.txt",
            "2026\\a.txt",
            "a\0.txt",
        ] {
            assert_eq!(sanitize_path(raw), None, "accepted {raw:?}");
        }
    }

    #[tokio::test]
    async fn traversal_is_denied_as_invalid_path() {
        let f = fixture();
        let outcome = f.gateway.handle(&request("../etc/passwd")).await.unwrap();
        assert_redirect(outcome, DenyReason::InvalidPath);
    }

    #[tokio::test]
    async fn missing_file_is_denied_as_invalid_path() {
        let f = fixture();
        let outcome = f.gateway.handle(&request("2026/nope.pdf")).await.unwrap();
        assert_redirect(outcome, DenyReason::InvalidPath);
    }

    #[tokio::test]
    async fn unmanaged_file_is_served_by_default() {
        let f = fixture();
        let outcome = f.gateway.handle(&request("2026/loose.txt")).await.unwrap();
        match outcome {
            AccessOutcome::Deliver(plan) => {
                assert_eq!(plan.headers().disposition, Disposition::Inline);
            }
            other => panic!("expected delivery, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unmanaged_file_is_denied_under_restrictive_policy() {
        let f = fixture();
        f.settings
            .put("unmanaged_policy", serde_json::json!("deny"));

        let outcome = f.gateway.handle(&request("2026/loose.txt")).await.unwrap();
        assert_redirect(outcome, DenyReason::UnmanagedRestricted);
    }

    #[tokio::test]
    async fn unprotected_resource_bypasses_all_rules() {
        let f = fixture();
        let mut res = protected_resource("2026/report.pdf");
        res.is_protected = false;
        // A deny list that would match everyone must not even be read.
        res.role_deny_list = Json(vec!["editor".to_string()]);
        f.resources.put(res);

        let outcome = f.gateway.handle(&request("2026/report.pdf")).await.unwrap();
        match outcome {
            AccessOutcome::Deliver(plan) => {
                assert_eq!(plan.headers().disposition, Disposition::Inline);
                assert_eq!(plan.headers().content_type, "application/pdf");
            }
            other => panic!("expected delivery, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn protected_resource_denies_anonymous_by_default() {
        let f = fixture();
        f.resources.put(protected_resource("2026/report.pdf"));

        let outcome = f.gateway.handle(&request("2026/report.pdf")).await.unwrap();
        assert_redirect(outcome, DenyReason::RestrictedDefault);
    }

    #[tokio::test]
    async fn resource_redirect_override_wins_over_site_root() {
        let f = fixture();
        let mut res = protected_resource("2026/report.pdf");
        res.redirect_url = Some("https://example.com/ask-sales".to_string());
        f.resources.put(res);

        match f.gateway.handle(&request("2026/report.pdf")).await.unwrap() {
            AccessOutcome::Redirect { location, .. } => {
                assert!(location.starts_with("https://example.com/ask-sales?"));
            }
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_token_is_consumed_and_served_as_attachment() {
        let f = fixture();
        let res = protected_resource("2026/report.pdf");
        let resource_id = res.id;
        f.resources.put(res);

        let policy = TokenPolicy::from_defaults(TokenDefaults {
            expiry_seconds: 3600,
            max_uses: 1,
        });
        let draft = f
            .tokens
            .generate(resource_id, &policy, &TokenOverrides::default());
        let value = f.tokens.store(&draft).await.unwrap();

        let mut req = request("2026/report.pdf");
        req.access_token = Some(value.clone());

        match f.gateway.handle(&req).await.unwrap() {
            AccessOutcome::Deliver(plan) => {
                assert_eq!(plan.headers().disposition, Disposition::Attachment);
            }
            other => panic!("expected delivery, got {other:?}"),
        }

        // The single use is gone; the same link now reports its state.
        let outcome = f.gateway.handle(&req).await.unwrap();
        assert_redirect(outcome, DenyReason::TokenUsedLimitReached);
    }

    #[tokio::test]
    async fn token_for_another_resource_is_rejected() {
        let f = fixture();
        f.resources.put(protected_resource("2026/report.pdf"));

        let policy = TokenPolicy::from_defaults(TokenDefaults {
            expiry_seconds: 3600,
            max_uses: 1,
        });
        let draft = f
            .tokens
            .generate(Uuid::new_v4(), &policy, &TokenOverrides::default());
        let value = f.tokens.store(&draft).await.unwrap();

        let mut req = request("2026/report.pdf");
        req.access_token = Some(value);

        let outcome = f.gateway.handle(&req).await.unwrap();
        assert_redirect(outcome, DenyReason::TokenInvalidResource);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let f = fixture();
        f.resources.put(protected_resource("2026/report.pdf"));

        let mut req = request("2026/report.pdf");
        req.access_token = Some("nope".to_string());

        let outcome = f.gateway.handle(&req).await.unwrap();
        assert_redirect(outcome, DenyReason::TokenNotFound);
    }

    #[tokio::test]
    async fn verified_crawler_is_served_inline() {
        let f = fixture();
        f.resources.put(protected_resource("2026/report.pdf"));

        let mut req = request("2026/report.pdf");
        req.user_agent = Some(BOT_UA.to_string());
        req.ip = Some("66.249.66.1".parse().unwrap());

        match f.gateway.handle(&req).await.unwrap() {
            AccessOutcome::Deliver(plan) => {
                assert_eq!(plan.headers().disposition, Disposition::Inline);
            }
            other => panic!("expected delivery, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn spoofed_crawler_falls_through_to_denial() {
        // Reverse record looks genuine but the forward zone does not
        // answer with the caller's address.
        let f = fixture_with(FixtureAccounts::default(), false);
        f.resources.put(protected_resource("2026/report.pdf"));

        let mut req = request("2026/report.pdf");
        req.user_agent = Some(BOT_UA.to_string());
        req.ip = Some("66.249.66.1".parse().unwrap());

        let outcome = f.gateway.handle(&req).await.unwrap();
        assert_redirect(outcome, DenyReason::RestrictedDefault);
    }

    #[tokio::test]
    async fn resource_bot_override_blocks_verified_crawler() {
        let f = fixture();
        let mut res = protected_resource("2026/report.pdf");
        res.bot_access = BotAccess::Deny;
        f.resources.put(res);

        let mut req = request("2026/report.pdf");
        req.user_agent = Some(BOT_UA.to_string());
        req.ip = Some("66.249.66.1".parse().unwrap());

        let outcome = f.gateway.handle(&req).await.unwrap();
        assert_redirect(outcome, DenyReason::RestrictedDefault);
    }

    #[tokio::test]
    async fn global_bot_flag_off_is_honoured_for_inherit() {
        let f = fixture();
        f.settings.put("allow_bots", serde_json::json!(false));
        f.resources.put(protected_resource("2026/report.pdf"));

        let mut req = request("2026/report.pdf");
        req.user_agent = Some(BOT_UA.to_string());
        req.ip = Some("66.249.66.1".parse().unwrap());

        let outcome = f.gateway.handle(&req).await.unwrap();
        assert_redirect(outcome, DenyReason::RestrictedDefault);
    }

    #[tokio::test]
    async fn session_cookie_grants_through_role_allow() {
        let expiration = Utc::now().timestamp() + 3600;
        let mut capabilities = HashMap::new();
        capabilities.insert("editor".to_string(), true);
        let mut registry = HashMap::new();
        registry.insert(
            mediagate_auth::session::signature::session_verifier("tok-1"),
            SessionEntry {
                expiration,
            },
        );
        let mut accounts = FixtureAccounts::default();
        accounts.accounts.insert(
            "alice".to_string(),
            Account {
                id: 42,
                username: "alice".to_string(),
                credential_hash: HASH.to_string(),
                capabilities: Json(capabilities),
                session_registry: Json(registry),
                created_at: Utc::now(),
            },
        );

        let f = fixture_with(accounts, true);
        let mut res = protected_resource("2026/report.pdf");
        res.role_allow_list = Json(vec!["editor".to_string()]);
        f.resources.put(res);

        let mut req = request("2026/report.pdf");
        req.cookie = Some(compose_cookie(SECRET, "alice", HASH, expiration, "tok-1"));

        match f.gateway.handle(&req).await.unwrap() {
            AccessOutcome::Deliver(plan) => {
                assert_eq!(plan.headers().disposition, Disposition::Inline);
            }
            other => panic!("expected delivery, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn global_user_deny_outranks_resource_role_allow() {
        let expiration = Utc::now().timestamp() + 3600;
        let mut capabilities = HashMap::new();
        capabilities.insert("editor".to_string(), true);
        let mut registry = HashMap::new();
        registry.insert(
            mediagate_auth::session::signature::session_verifier("tok-1"),
            SessionEntry {
                expiration,
            },
        );
        let mut accounts = FixtureAccounts::default();
        accounts.accounts.insert(
            "alice".to_string(),
            Account {
                id: 42,
                username: "alice".to_string(),
                credential_hash: HASH.to_string(),
                capabilities: Json(capabilities),
                session_registry: Json(registry),
                created_at: Utc::now(),
            },
        );

        let f = fixture_with(accounts, true);
        f.settings.put(
            "access_lists",
            serde_json::json!({"user_deny": [42]}),
        );
        let mut res = protected_resource("2026/report.pdf");
        res.role_allow_list = Json(vec!["editor".to_string()]);
        f.resources.put(res);

        let mut req = request("2026/report.pdf");
        req.cookie = Some(compose_cookie(SECRET, "alice", HASH, expiration, "tok-1"));

        let outcome = f.gateway.handle(&req).await.unwrap();
        assert_redirect(outcome, DenyReason::GlobalUserDeny);
    }
}
