// Bearer-token extractor for protected routes

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::{debug, warn};

use crate::auth::{
    error::AuthError,
    models::Role,
    permissions::Capability,
    token::TokenService,
};

/// Authenticated user extracted from the `Authorization: Bearer` header
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Fail with `InsufficientPermissions` unless the role grants `capability`
    pub fn require(&self, capability: Capability) -> Result<(), AuthError> {
        if self.role.allows(capability) {
            debug!(
                "Authorized user_id={} role={} for {}",
                self.user_id, self.role, capability
            );
            Ok(())
        } else {
            warn!(
                "Authorization failed: user_id={} role={} capability={}",
                self.user_id, self.role, capability
            );
            Err(AuthError::InsufficientPermissions {
                role: self.role,
                capability,
            })
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let tokens = Arc::<TokenService>::from_ref(state);
        let claims = tokens.validate_access_token(token)?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}
