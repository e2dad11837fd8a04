//! # mediagate-database
//!
//! PostgreSQL access layer: pool construction, migration runner, and
//! one repository per entity. Repositories map every driver error into
//! [`mediagate_core::AppError`] with `ErrorKind::Database`.

pub mod connection;
pub mod migration;
pub mod repositories;
