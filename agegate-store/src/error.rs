//! Store error types

use thiserror::Error;

/// Store error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No verification attempt {0}")]
    AttemptMissing(String),

    #[error("Session {0} already belongs to another attempt")]
    SessionTaken(String),
}

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;
