//! The media gateway endpoint.
//!
//! Thin translation between HTTP and the request gateway: pull the
//! path, token, cookie, User-Agent, and client address out of the
//! request, hand them to the gateway, and render its outcome — a
//! stream, an offload header, or a fallback redirect.

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use mediagate_core::error::AppError;
use mediagate_service::delivery::{DeliveryHeaders, DeliveryPlan};
use mediagate_service::gateway::{AccessOutcome, AccessRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters accepted by the media endpoint.
#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    /// Presented access token.
    pub access_token: Option<String>,
}

/// GET /media/{*path}
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<MediaQuery>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let request = AccessRequest {
        path,
        access_token: query.access_token,
        cookie: cookie_value(&headers, &state.config.auth.cookie_name),
        user_agent: header_value(&headers, header::USER_AGENT.as_str()),
        ip: Some(client_ip(&headers, peer)),
    };

    match state.gateway.handle(&request).await? {
        AccessOutcome::Deliver(plan) => render_delivery(plan).await,
        AccessOutcome::Redirect { location, .. } => {
            let response = secured(Response::builder().status(StatusCode::FOUND))
                .header(header::LOCATION, location)
                .body(Body::empty())
                .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;
            Ok(response)
        }
    }
}

/// Render a delivery plan into an HTTP response.
async fn render_delivery(plan: DeliveryPlan) -> Result<Response, ApiError> {
    match plan {
        DeliveryPlan::Offload {
            header_name,
            header_value,
            headers,
        } => {
            let response = with_delivery_headers(Response::builder(), &headers)
                .header(header_name, header_value)
                .body(Body::empty())
                .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;
            Ok(response)
        }
        DeliveryPlan::Stream { file_path, headers } => {
            let file = tokio::fs::File::open(&file_path).await.map_err(|e| {
                AppError::with_source(
                    mediagate_core::error::ErrorKind::Storage,
                    "Failed to open file for streaming",
                    e,
                )
            })?;
            let size = file.metadata().await.ok().map(|meta| meta.len());

            let mut builder = with_delivery_headers(Response::builder(), &headers);
            if let Some(size) = size {
                builder = builder.header(header::CONTENT_LENGTH, size);
            }
            let response = builder
                .body(Body::from_stream(ReaderStream::new(file)))
                .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;
            Ok(response)
        }
    }
}

/// Apply the plan's content, disposition, and cache headers plus the
/// always-on protection headers.
fn with_delivery_headers(
    builder: axum::http::response::Builder,
    headers: &DeliveryHeaders,
) -> axum::http::response::Builder {
    secured(builder.status(StatusCode::OK))
        .header(header::CONTENT_TYPE, &headers.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            headers.disposition.header_value(&headers.filename),
        )
        .header(header::CACHE_CONTROL, headers.cache.header_value())
}

/// The protection headers every media response carries.
fn secured(builder: axum::http::response::Builder) -> axum::http::response::Builder {
    builder
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::X_FRAME_OPTIONS, "SAMEORIGIN")
}

/// The client address, preferring the forwarded chain's first hop.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .unwrap_or_else(|| peer.ip())
}

/// A named cookie's value from the Cookie header.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_chain_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.9, 10.0.0.1".parse().unwrap(),
        );
        let peer: SocketAddr = "127.0.0.1:1234".parse().unwrap();

        assert_eq!(
            client_ip(&headers, peer),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn peer_address_is_the_fallback() {
        let peer: SocketAddr = "192.0.2.7:4321".parse().unwrap();
        assert_eq!(
            client_ip(&HeaderMap::new(), peer),
            "192.0.2.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn named_cookie_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "other=1; mg_session=alice|1|tok|sig; theme=dark"
                .parse()
                .unwrap(),
        );

        assert_eq!(
            cookie_value(&headers, "mg_session"),
            Some("alice|1|tok|sig".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
