//! Error taxonomy shared by every layer of the crate.
//!
//! All services and repositories return [`DomainResult`]; no other error
//! type crosses a port boundary. Repositories translate storage failures
//! into the nearest [`ErrorKind`] before they reach a service, and services
//! pass errors upward unchanged. The (external) API layer performs the one
//! translation into the wire format via [`DomainError::to_problem`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type used by every service and repository operation.
pub type DomainResult<T> = Result<T, DomainError>;

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A single-id lookup found nothing.
    NotFound,
    /// Input or state violated a business rule.
    Validation,
    /// The operation collided with existing state (duplicate key).
    Conflict,
    /// The storage engine failed in a way the caller cannot repair.
    Database,
    /// The caller is not permitted to perform the operation.
    Authorization,
    /// The caller's identity could not be established.
    Authentication,
    /// A concurrent modification invalidated the operation.
    Concurrency,
}

impl ErrorKind {
    /// Returns the stable machine-readable code for this kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::Database => "database",
            Self::Authorization => "authorization",
            Self::Authentication => "authentication",
            Self::Concurrency => "concurrency",
        }
    }

    /// Returns the human-readable title used in problem documents.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::NotFound => "Resource Not Found",
            Self::Validation => "Validation Failed",
            Self::Conflict => "Conflict",
            Self::Database => "Storage Failure",
            Self::Authorization => "Forbidden",
            Self::Authentication => "Unauthenticated",
            Self::Concurrency => "Concurrent Modification",
        }
    }

    /// Returns the HTTP status the boundary layer maps this kind to.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Validation => 422,
            Self::Conflict | Self::Concurrency => 409,
            Self::Database => 500,
            Self::Authorization => 403,
            Self::Authentication => 401,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Failure value carried by every [`DomainResult`].
///
/// Storage-level causes are flattened into the message so the error stays
/// `Clone` and comparable in tests; nothing downstream inspects source
/// chains, only the kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct DomainError {
    kind: ErrorKind,
    message: String,
}

impl DomainError {
    /// Creates an error of an arbitrary kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a [`ErrorKind::NotFound`] error for a missing entity.
    #[must_use]
    pub fn not_found(entity: &str, id: impl fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound, format!("{entity} '{id}' not found"))
    }

    /// Creates a [`ErrorKind::Validation`] error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Creates a [`ErrorKind::Conflict`] error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Creates a [`ErrorKind::Database`] error from a storage failure.
    #[must_use]
    pub fn database(cause: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Database, cause.to_string())
    }

    /// Creates a [`ErrorKind::Authorization`] error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Creates a [`ErrorKind::Authentication`] error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Creates a [`ErrorKind::Concurrency`] error.
    #[must_use]
    pub fn concurrency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Concurrency, message)
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status the boundary layer maps this error to.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    /// Renders the RFC 9457 problem-details document for this error.
    ///
    /// `instance` identifies the request that failed (typically the
    /// request path); the boundary layer supplies it.
    #[must_use]
    pub fn to_problem(&self, instance: impl Into<String>) -> ProblemDetails {
        ProblemDetails {
            problem_type: format!("urn:backlog:error:{}", self.kind.code()),
            title: self.kind.title().to_owned(),
            status: self.kind.http_status(),
            detail: self.message.clone(),
            instance: instance.into(),
        }
    }
}

/// RFC 9457 problem-details wire shape produced at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemDetails {
    /// URN identifying the error category.
    #[serde(rename = "type")]
    pub problem_type: String,
    /// Human-readable summary of the category.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Human-readable description of this occurrence.
    pub detail: String,
    /// Identifier of the failing request.
    pub instance: String,
}
