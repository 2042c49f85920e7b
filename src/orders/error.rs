use uuid::Uuid;

use crate::catalog::CatalogError;
use crate::error::ApiError;

/// Error types for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error(transparent)]
    Pricing(#[from] CatalogError),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Store not found: {0}")]
    StoreNotFound(i32),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Check codes do not match")]
    CheckCodeMismatch,

    #[error("Order {0} must be paid before pickup")]
    NotPaid(String),

    #[error("Order {0} has already been picked up")]
    AlreadyPickedUp(String),

    #[error("Could not allocate a unique order number after {0} attempts")]
    OrderNumberExhausted(u32),
}

impl OrderError {
    pub fn not_found(id: Uuid) -> Self {
        OrderError::NotFound(id.to_string())
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::DatabaseError(e) => ApiError::from(e),
            OrderError::Pricing(e) => ApiError::from(e),
            OrderError::NotFound(id) => ApiError::not_found("Order", id),
            OrderError::StoreNotFound(id) => ApiError::not_found("Store", id),
            OrderError::InvalidTransition(msg) => ApiError::InvalidTransition(msg),
            OrderError::CheckCodeMismatch => ApiError::CheckCodeMismatch,
            OrderError::NotPaid(order_number) => ApiError::NotPaid { order_number },
            OrderError::AlreadyPickedUp(order_number) => ApiError::AlreadyPickedUp { order_number },
            OrderError::OrderNumberExhausted(_) => ApiError::Conflict {
                message: "Could not allocate a unique order number, please retry".to_string(),
            },
        }
    }
}
