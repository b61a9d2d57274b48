//! Error types for backend operations.

use thiserror::Error;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors a backend can surface to the engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// No league matches the invite code.
    #[error("invalid invite code")]
    InvalidCode,

    /// The identity already created its one free league.
    #[error("free league already used")]
    FreeQuotaExhausted,

    /// Requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input failed server-side validation.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Transient transport failure; retryable by the caller.
    #[error("network error: {0}")]
    Network(String),
}
