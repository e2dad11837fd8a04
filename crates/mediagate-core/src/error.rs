//! The unified error type for Mediagate.
//!
//! Expected access-control outcomes (a denied request, an exhausted
//! token) are ordinary typed values, never errors. [`AppError`] covers
//! the infrastructure failures behind them: the database, the cache,
//! file I/O, DNS, and configuration. Every crate maps its internal
//! failures into this one type so `?` composes across the workspace.

use std::fmt;

use thiserror::Error;

/// Failure categories the workspace distinguishes.
///
/// Identity failures have no kind here on purpose: a bad cookie or a
/// stale session resolves to the anonymous principal and the pipeline
/// keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The named entity does not exist.
    NotFound,
    /// The caller's input was rejected before touching any store.
    Validation,
    /// A uniqueness or state guard refused the operation (duplicate
    /// token value, concurrent status transition).
    Conflict,
    /// An invariant inside this process broke.
    Internal,
    /// The database refused or dropped an operation.
    Database,
    /// The cache backend failed.
    Cache,
    /// Reading or streaming a file failed.
    Storage,
    /// The process cannot assemble a usable configuration.
    Configuration,
    /// A value could not be serialized or parsed.
    Serialization,
    /// An upstream service (the DNS resolver) failed or timed out.
    ExternalService,
    /// The service cannot take requests right now.
    ServiceUnavailable,
}

impl ErrorKind {
    /// Stable upper-case code for logs and API bodies.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL",
            Self::Database => "DATABASE",
            Self::Cache => "CACHE",
            Self::Storage => "STORAGE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::ExternalService => "EXTERNAL_SERVICE",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An infrastructure failure, categorized and carrying its cause.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable description; safe to log, not guaranteed safe
    /// to expose.
    pub message: String,
    /// The underlying error, when one exists.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// An error with no underlying cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// An error wrapping the failure that produced it.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for [`ErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Shorthand for [`ErrorKind::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Shorthand for [`ErrorKind::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Shorthand for [`ErrorKind::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Shorthand for [`ErrorKind::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Shorthand for [`ErrorKind::ExternalService`].
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorKind::Serialization, "JSON value did not parse", err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, "File operation failed", err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(ErrorKind::Configuration, "Configuration did not load", err)
    }
}
