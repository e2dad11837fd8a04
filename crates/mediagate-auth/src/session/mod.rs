//! Cookie-based session authentication.

pub mod authenticator;
pub mod cookie;
pub mod signature;

pub use authenticator::{AccountSource, SessionAuthenticator};
pub use cookie::AuthCookie;
