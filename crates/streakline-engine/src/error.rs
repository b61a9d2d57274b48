//! Error types for the engine.

use std::time::Duration;

use streakline_backend::BackendError;
use streakline_model::PlanTier;

/// Errors surfaced by admission, mutation, and session operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("caller is not authenticated")]
    NotAuthenticated,

    #[error("invalid invite code")]
    InvalidCode,

    #[error("free league allowance already used")]
    FreeQuotaExhausted,

    #[error("plan tier {required} must be accepted before continuing")]
    PaymentRequired { required: PlanTier },

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("write rejected: {0}")]
    WriteRejected(String),

    #[error("plan acceptance failed: {0}")]
    AcceptanceFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::InvalidCode => Error::InvalidCode,
            BackendError::FreeQuotaExhausted => Error::FreeQuotaExhausted,
            BackendError::NotFound(what) => Error::NotFound(what),
            BackendError::Rejected(reason) => Error::InvalidInput(reason),
            BackendError::Network(reason) => Error::Network(reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
