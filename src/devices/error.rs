use crate::error::ApiError;

/// Error types for device operations
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Store not found: {0}")]
    StoreNotFound(i32),

    #[error("Device already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<DeviceError> for ApiError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::DatabaseError(e) => ApiError::from(e),
            DeviceError::NotFound(code) => ApiError::not_found("Device", code),
            DeviceError::StoreNotFound(id) => ApiError::not_found("Store", id),
            DeviceError::AlreadyRegistered(code) => ApiError::Conflict {
                message: format!("Device {} is already registered", code),
            },
            DeviceError::InvalidInput(msg) => ApiError::InvalidInput(msg),
        }
    }
}
