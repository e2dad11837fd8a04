//! Route definitions for the Mediagate HTTP surface.
//!
//! The media gateway endpoint lives at the root; the token
//! administration API is mounted under `/api`.

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(token_routes())
        .merge(resource_routes());

    Router::new()
        .route("/media/{*path}", get(handlers::media::serve_media))
        .route("/health", get(handlers::health::health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Token lifecycle administration.
fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/tokens", post(handlers::tokens::issue_token))
        .route("/tokens/cleanup", post(handlers::tokens::cleanup_tokens))
        .route("/tokens/{value}", get(handlers::tokens::get_token))
        .route("/tokens/{value}", delete(handlers::tokens::delete_token))
        .route(
            "/tokens/{value}/revoke",
            post(handlers::tokens::revoke_token),
        )
        .route(
            "/tokens/{value}/reinstate",
            post(handlers::tokens::reinstate_token),
        )
        .route(
            "/tokens/{value}/max-uses",
            put(handlers::tokens::update_max_uses),
        )
}

/// Per-resource token listing.
fn resource_routes() -> Router<AppState> {
    Router::new().route(
        "/resources/{id}/tokens",
        get(handlers::tokens::list_resource_tokens),
    )
}
