//! Shared domain types.

pub mod principal;
pub mod reason;

pub use principal::Principal;
pub use reason::{AccessReason, DenyReason};
