use crate::engine::EngineError;
use crate::orchestration::post_processor::PostProcessError;
use thiserror::Error;

/// Errors returned by `NegotiationService` operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Schedule generation error: {0}")]
    Generation(#[from] PostProcessError),
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl From<EngineError> for ServiceError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidArgument(msg) => ServiceError::InvalidArgument(msg),
            other => ServiceError::InvalidArgument(other.to_string()),
        }
    }
}
