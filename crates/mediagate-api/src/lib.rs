//! # mediagate-api
//!
//! HTTP layer for Mediagate built on Axum.
//!
//! Exposes the media gateway endpoint, the token administration API
//! for the host's administrative layer, a health endpoint, and the
//! mapping from [`mediagate_core::AppError`] to HTTP responses.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
