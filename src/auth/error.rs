// Authentication and authorization error types

use axum::response::{IntoResponse, Response};

use crate::auth::permissions::Capability;
use crate::auth::models::Role;
use crate::error::ApiError;

/// Authentication and authorization error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("PIN not set for user")]
    PinNotSet,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("User not found: {0}")]
    UserNotFound(i32),

    #[error("Password hashing error")]
    PasswordHashError,

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    /// Role lacks the capability required by the operation
    #[error("Role '{role}' is not allowed to {capability}")]
    InsufficientPermissions { role: Role, capability: Capability },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::PinNotSet
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::MissingToken => ApiError::Unauthorized(err.to_string()),
            AuthError::UsernameAlreadyExists => ApiError::Conflict {
                message: err.to_string(),
            },
            AuthError::UserNotFound(id) => ApiError::not_found("User", id),
            AuthError::PasswordHashError | AuthError::TokenGenerationError(_) => {
                ApiError::InternalError(err.to_string())
            }
            AuthError::InsufficientPermissions { .. } => ApiError::Forbidden(err.to_string()),
            AuthError::DatabaseError(e) => ApiError::from(e),
        }
    }
}

/// Used as the rejection type of the bearer-token extractor
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_auth_errors_map_to_401() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::PinNotSet,
            AuthError::InvalidToken,
            AuthError::ExpiredToken,
            AuthError::MissingToken,
        ] {
            assert_eq!(ApiError::from(err).status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_insufficient_permissions_maps_to_403() {
        let err = AuthError::InsufficientPermissions {
            role: Role::PosUser,
            capability: Capability::AdjustStock,
        };
        assert_eq!(
            err.to_string(),
            "Role 'pos_user' is not allowed to adjust_stock"
        );
        assert_eq!(ApiError::from(err).status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_duplicate_username_is_conflict() {
        assert_eq!(
            ApiError::from(AuthError::UsernameAlreadyExists).status_code(),
            StatusCode::CONFLICT
        );
    }
}
