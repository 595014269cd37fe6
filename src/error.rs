use std::sync::Arc;
use thiserror::Error;

/// Directory-layer error source.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result of a single directory or cache lookup.
pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Errors returned by configuration and parsing code.
///
/// None of these ever escape [`crate::Authorizer::authorize`]; a request-time
/// failure always resolves to [`crate::Decision::Deny`].
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// Invalid identifier input.
    #[error("invalid id: {0}")]
    InvalidId(String),
    /// Unrecognized enumerated value (operation, resource type, share permission).
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Outcome of a failed directory lookup.
///
/// `NotFound` is an authoritative answer and is never retried. `Transient`
/// covers I/O and connectivity failures and may be retried by the caller.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The directory holds no matching row.
    #[error("not found in project directory")]
    NotFound,
    /// The directory could not be reached or failed mid-query.
    #[error("transient directory failure: {0}")]
    Transient(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl LookupError {
    /// Wraps an infrastructural failure as a transient lookup error.
    pub fn transient(source: impl Into<SourceError>) -> Self {
        Self::Transient(Arc::from(source.into()))
    }

    /// Returns true when a retry may produce a different answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
