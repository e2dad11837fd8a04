//! # mediagate-auth
//!
//! Request-identity resolution for the access core:
//!
//! - [`session`] — validates the host's signed identity cookie into a
//!   [`mediagate_core::types::Principal`] without loading the host
//!   application.
//! - [`bot`] — verifies claimed crawlers with a signature match plus a
//!   cached reverse-then-forward DNS confirmation.

pub mod bot;
pub mod session;

pub use bot::BotVerifier;
pub use session::SessionAuthenticator;
