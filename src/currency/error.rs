use crate::error::ApiError;

/// Error types for currency rate operations
#[derive(Debug, thiserror::Error)]
pub enum CurrencyError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Currency rate not found: {0}")]
    NotFound(String),

    #[error("Currency rate already exists: {0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Upstream(String),
}

impl From<CurrencyError> for ApiError {
    fn from(err: CurrencyError) -> Self {
        match err {
            CurrencyError::DatabaseError(e) => ApiError::from(e),
            CurrencyError::NotFound(code) => ApiError::not_found("Currency rate", code),
            CurrencyError::AlreadyExists(code) => ApiError::Conflict {
                message: format!("Currency rate for {} already exists", code),
            },
            CurrencyError::Upstream(msg) => ApiError::UpstreamError(msg),
        }
    }
}
