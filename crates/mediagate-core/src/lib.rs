//! # mediagate-core
//!
//! Core crate for Mediagate. Contains traits, configuration schemas,
//! the access-reason vocabulary, the request principal type, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Mediagate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
