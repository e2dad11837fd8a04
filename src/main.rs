//! Mediagate Server — gated delivery for a shared upload tree.
//!
//! Main entry point that wires all crates together and starts the
//! server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use mediagate_auth::bot::{BotVerifier, HickoryDnsResolver};
use mediagate_auth::session::SessionAuthenticator;
use mediagate_cache::MemoryCacheProvider;
use mediagate_core::config::AppConfig;
use mediagate_core::error::AppError;
use mediagate_core::traits::cache::CacheProvider;
use mediagate_database::repositories::account::AccountRepository;
use mediagate_database::repositories::resource::ResourceRepository;
use mediagate_database::repositories::settings::SettingsRepository;
use mediagate_database::repositories::token::TokenRepository;
use mediagate_service::gateway::RequestGateway;
use mediagate_service::settings::SettingsProvider;
use mediagate_service::token::TokenService;

#[tokio::main]
async fn main() {
    let env = std::env::var("MEDIAGATE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Mediagate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db_pool = mediagate_database::connection::create_pool(&config.database).await?;
    mediagate_database::migration::run_migrations(&db_pool).await?;

    // ── Step 2: Initialize cache ─────────────────────────────────
    let cache: Arc<dyn CacheProvider> = Arc::new(MemoryCacheProvider::new(&config.cache));
    tracing::info!("Cache initialized");

    // ── Step 3: Initialize repositories ──────────────────────────
    let resource_repo = Arc::new(ResourceRepository::new(db_pool.clone()));
    let account_repo = Arc::new(AccountRepository::new(db_pool.clone()));
    let settings_repo = Arc::new(SettingsRepository::new(db_pool.clone()));
    let token_repo = Arc::new(TokenRepository::new(db_pool.clone()));

    // ── Step 4: Initialize services ──────────────────────────────
    let settings = SettingsProvider::new(
        settings_repo,
        Arc::clone(&cache),
        Duration::from_secs(config.cache.default_ttl_seconds),
    );
    let tokens = TokenService::new(token_repo);
    let sessions = SessionAuthenticator::new(account_repo, config.auth.clone());
    let resolver = Arc::new(HickoryDnsResolver::new(&config.bot));
    let bots = BotVerifier::new(resolver, Arc::clone(&cache));

    let gateway = RequestGateway::new(
        Arc::clone(&resource_repo) as Arc<dyn mediagate_service::gateway::ResourceSource>,
        settings.clone(),
        tokens.clone(),
        sessions,
        bots,
        config.uploads.clone(),
        config.delivery.clone(),
    );
    tracing::info!("Services initialized");

    // ── Step 5: Build and start HTTP server ──────────────────────
    let addr = config.server.bind_address();

    let app_state = mediagate_api::state::AppState {
        config: Arc::new(config),
        db_pool,
        gateway: Arc::new(gateway),
        tokens: Arc::new(tokens),
        resources: resource_repo,
        settings: Arc::new(settings),
    };

    let app = mediagate_api::router::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Mediagate server listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Mediagate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
