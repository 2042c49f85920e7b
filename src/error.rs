// Error handling module for the POS API
// Provides the shared error type and its HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use tracing::{debug, error, warn};

/// Main error type for the API
/// All handlers return Result<T, ApiError>
///
/// Domain modules keep their own error enums and convert into this one,
/// so every failure reaches the client in the same JSON shape.
#[derive(Debug)]
pub enum ApiError {
    /// Request body failed field validation
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Semantically invalid input that passed field validation
    /// Maps to HTTP 400 Bad Request
    InvalidInput(String),

    /// Resource not found by ID
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Duplicate resource or lost write race
    /// Maps to HTTP 409 Conflict
    Conflict { message: String },

    /// Order or restock status guard violated
    /// Maps to HTTP 400 Bad Request
    InvalidTransition(String),

    /// No active cost row for a product being priced
    /// Maps to HTTP 404 Not Found
    CostNotFound { product_id: i32 },

    /// No active product-sector discount where one was required
    /// Maps to HTTP 404 Not Found
    DiscountNotFound { product_id: i32, sector_id: i32 },

    /// Pickup check codes do not match the stored codes
    /// Maps to HTTP 409 Conflict
    CheckCodeMismatch,

    /// Order was already picked up
    /// Maps to HTTP 409 Conflict
    AlreadyPickedUp { order_number: String },

    /// Order has no evidence of payment
    /// Maps to HTTP 409 Conflict
    NotPaid { order_number: String },

    /// Database operation errors
    /// Maps to HTTP 500 Internal Server Error
    /// Sensitive details are filtered from client responses
    StorageError(sqlx::Error),

    /// Failure talking to an outbound collaborator (currency feed)
    /// Maps to HTTP 502 Bad Gateway
    UpstreamError(String),

    /// Internal server errors
    /// Maps to HTTP 500 Internal Server Error
    InternalError(String),

    /// Authentication failures
    /// Maps to HTTP 401 Unauthorized
    Unauthorized(String),

    /// Authorization failures
    /// Maps to HTTP 403 Forbidden
    Forbidden(String),
}

/// Consistent error response structure
///
/// Machine-readable `error_code` plus a human-readable `message`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "NOT_FOUND")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (e.g., field-level validation errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,

    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Logging follows severity:
    /// - error!: storage, upstream and internal failures (5xx)
    /// - warn!: auth failures and conflicting writes
    /// - debug!: expected client errors (validation, not found, guards)
    pub fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        let status = self.status_code();
        let response = match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                let mut response = ErrorResponse::new("VALIDATION_ERROR", "Request validation failed");
                response.details =
                    Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({})));
                response
            }
            ApiError::InvalidInput(message) => {
                debug!("Invalid input: {}", message);
                ErrorResponse::new("INVALID_INPUT", message.clone())
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                ErrorResponse::new("NOT_FOUND", format!("{} with id {} not found", resource, id))
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                ErrorResponse::new("CONFLICT", message.clone())
            }
            ApiError::InvalidTransition(message) => {
                debug!("Invalid transition: {}", message);
                ErrorResponse::new("INVALID_TRANSITION", message.clone())
            }
            ApiError::CostNotFound { product_id } => {
                debug!("No active cost for product {}", product_id);
                ErrorResponse::new(
                    "COST_NOT_FOUND",
                    format!("Product {} has no active cost", product_id),
                )
            }
            ApiError::DiscountNotFound { product_id, sector_id } => {
                debug!("No active discount for product {} sector {}", product_id, sector_id);
                ErrorResponse::new(
                    "DISCOUNT_NOT_FOUND",
                    format!(
                        "Product {} has no active discount for sector {}",
                        product_id, sector_id
                    ),
                )
            }
            ApiError::CheckCodeMismatch => {
                warn!("Pickup rejected: check codes do not match");
                ErrorResponse::new("CHECK_CODE_MISMATCH", "Check codes do not match")
            }
            ApiError::AlreadyPickedUp { order_number } => {
                debug!("Order {} already picked up", order_number);
                ErrorResponse::new(
                    "ALREADY_PICKED_UP",
                    format!("Order {} has already been picked up", order_number),
                )
            }
            ApiError::NotPaid { order_number } => {
                debug!("Order {} not paid", order_number);
                ErrorResponse::new(
                    "NOT_PAID",
                    format!("Order {} must be paid before pickup", order_number),
                )
            }
            ApiError::StorageError(db_error) => {
                // Full error stays in the logs only
                error!("Database error: {:?}", db_error);
                ErrorResponse::new("STORAGE_ERROR", "A database error occurred")
            }
            ApiError::UpstreamError(message) => {
                error!("Upstream error: {}", message);
                ErrorResponse::new("UPSTREAM_ERROR", message.clone())
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                ErrorResponse::new("INTERNAL_ERROR", "An internal server error occurred")
            }
            ApiError::Unauthorized(message) => {
                warn!("Unauthorized access attempt: {}", message);
                ErrorResponse::new("UNAUTHORIZED", message.clone())
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                ErrorResponse::new("FORBIDDEN", message.clone())
            }
        };
        (status, response)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            ApiError::CostNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::DiscountNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::CheckCodeMismatch => StatusCode::CONFLICT,
            ApiError::AlreadyPickedUp { .. } => StatusCode::CONFLICT,
            ApiError::NotPaid { .. } => StatusCode::CONFLICT,
            ApiError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

/// Convert sqlx errors to ApiError
///
/// Unique-index violations surface as conflicts: they are how a losing
/// concurrent writer of a versioned row is detected.
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                return ApiError::Conflict {
                    message: format!(
                        "Conflicting write on {}",
                        db_err.constraint().unwrap_or("a unique key")
                    ),
                };
            }
        }
        ApiError::StorageError(error)
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::InvalidTransition("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::CostNotFound { product_id: 1 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::CheckCodeMismatch.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::AlreadyPickedUp { order_number: "ORD-1".into() }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::UpstreamError("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Forbidden("no".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_error_codes() {
        let (_, body) = ApiError::CheckCodeMismatch.to_error_response();
        assert_eq!(body.error_code, "CHECK_CODE_MISMATCH");

        let (_, body) = ApiError::not_found("Order", 42).to_error_response();
        assert_eq!(body.error_code, "NOT_FOUND");
        assert_eq!(body.message, "Order with id 42 not found");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let (status, body) =
            ApiError::InternalError("secret stack trace".into()).to_error_response();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("secret"));
    }

    #[test]
    fn test_row_not_found_is_storage_error() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::StorageError(_)));
    }
}
