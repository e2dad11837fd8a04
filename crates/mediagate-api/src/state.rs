//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use mediagate_core::config::AppConfig;
use mediagate_database::repositories::resource::ResourceRepository;
use mediagate_service::gateway::RequestGateway;
use mediagate_service::settings::SettingsProvider;
use mediagate_service::token::TokenService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// The access decision pipeline.
    pub gateway: Arc<RequestGateway>,
    /// Token lifecycle service, for the administration API.
    pub tokens: Arc<TokenService>,
    /// Resource lookups, for the administration API.
    pub resources: Arc<ResourceRepository>,
    /// Typed runtime settings.
    pub settings: Arc<SettingsProvider>,
}
