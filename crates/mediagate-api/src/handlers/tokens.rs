//! Token administration handlers.
//!
//! Called by the host's administrative layer; the screens themselves
//! live elsewhere. Every operation delegates to the token service and
//! reports expected failures as typed API errors.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use mediagate_core::error::AppError;
use mediagate_service::token::TokenPolicy;

use crate::dto::request::{IssueTokenRequest, ReinstateTokenRequest, UpdateMaxUsesRequest};
use crate::dto::response::{
    ApiResponse, CleanupResponse, IssuedTokenResponse, MessageResponse, TokenResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/tokens
pub async fn issue_token(
    State(state): State<AppState>,
    Json(body): Json<IssueTokenRequest>,
) -> Result<Json<ApiResponse<IssuedTokenResponse>>, ApiError> {
    let resource = state
        .resources
        .find_by_id(body.resource_id)
        .await?
        .ok_or_else(|| AppError::not_found("Resource not found"))?;

    let defaults = state.settings.token_defaults().await?;
    let issued = state
        .tokens
        .issue(
            &resource,
            defaults,
            &body.overrides(),
            &state.config.uploads.base_url,
        )
        .await?;

    Ok(Json(ApiResponse::ok(issued.into())))
}

/// GET /api/tokens/{value}
pub async fn get_token(
    State(state): State<AppState>,
    Path(value): Path<String>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let token = state
        .tokens
        .get(&value)
        .await?
        .ok_or_else(|| AppError::not_found("Token not found"))?;

    Ok(Json(ApiResponse::ok(token.into())))
}

/// POST /api/tokens/{value}/revoke
pub async fn revoke_token(
    State(state): State<AppState>,
    Path(value): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if state.tokens.get(&value).await?.is_none() {
        return Err(AppError::not_found("Token not found").into());
    }
    if !state.tokens.revoke(&value).await? {
        return Err(AppError::conflict("Only active tokens can be revoked").into());
    }

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Token revoked".to_string(),
    })))
}

/// POST /api/tokens/{value}/reinstate
pub async fn reinstate_token(
    State(state): State<AppState>,
    Path(value): Path<String>,
    Json(body): Json<ReinstateTokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let token = state
        .tokens
        .get(&value)
        .await?
        .ok_or_else(|| AppError::not_found("Token not found"))?;

    let defaults = state.settings.token_defaults().await?;
    // The resource may have been deleted since issuance; fall back to
    // the global defaults for the fresh expiry.
    let policy = match state.resources.find_by_id(token.resource_id).await? {
        Some(resource) => TokenPolicy::for_resource(&resource, defaults),
        None => TokenPolicy::from_defaults(defaults),
    };

    state
        .tokens
        .reinstate(&value, &policy, &body.overrides())
        .await?;

    let token = state
        .tokens
        .get(&value)
        .await?
        .ok_or_else(|| AppError::not_found("Token not found"))?;
    Ok(Json(ApiResponse::ok(token.into())))
}

/// PUT /api/tokens/{value}/max-uses
pub async fn update_max_uses(
    State(state): State<AppState>,
    Path(value): Path<String>,
    Json(body): Json<UpdateMaxUsesRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let token = state
        .tokens
        .get(&value)
        .await?
        .ok_or_else(|| AppError::not_found("Token not found"))?;

    let resource_cap = state
        .resources
        .find_by_id(token.resource_id)
        .await?
        .and_then(|resource| resource.token_max_uses_override);

    state
        .tokens
        .update_max_uses(&value, body.max_uses, resource_cap)
        .await?;

    let token = state
        .tokens
        .get(&value)
        .await?
        .ok_or_else(|| AppError::not_found("Token not found"))?;
    Ok(Json(ApiResponse::ok(token.into())))
}

/// DELETE /api/tokens/{value}
pub async fn delete_token(
    State(state): State<AppState>,
    Path(value): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if !state.tokens.delete(&value).await? {
        return Err(AppError::not_found("Token not found").into());
    }

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Token deleted".to_string(),
    })))
}

/// POST /api/tokens/cleanup
pub async fn cleanup_tokens(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CleanupResponse>>, ApiError> {
    let options = state.settings.cleanup_options().await?;
    let report = state.tokens.cleanup(&options).await?;

    Ok(Json(ApiResponse::ok(report.into())))
}

/// GET /api/resources/{id}/tokens
pub async fn list_resource_tokens(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<TokenResponse>>>, ApiError> {
    if state.resources.find_by_id(id).await?.is_none() {
        return Err(AppError::not_found("Resource not found").into());
    }

    let tokens = state.tokens.list_for_resource(id).await?;
    Ok(Json(ApiResponse::ok(
        tokens.into_iter().map(TokenResponse::from).collect(),
    )))
}
