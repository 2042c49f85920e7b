use crate::error::ApiError;

/// Error types for stock, store, and restock operations
#[derive(Debug, thiserror::Error)]
pub enum StockError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Store not found: {0}")]
    StoreNotFound(i32),

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Restock order not found: {0}")]
    RestockNotFound(i32),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::DatabaseError(e) => ApiError::from(e),
            StockError::StoreNotFound(id) => ApiError::not_found("Store", id),
            StockError::ProductNotFound(id) => ApiError::not_found("Product", id),
            StockError::RestockNotFound(id) => ApiError::not_found("Restock order", id),
            StockError::InvalidTransition(msg) => ApiError::InvalidTransition(msg),
            StockError::InvalidInput(msg) => ApiError::InvalidInput(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(StockError::RestockNotFound(3)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StockError::InvalidTransition("received to cancelled".into()))
                .status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
