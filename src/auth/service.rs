// Authentication service - business logic layer

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{
    error::AuthError,
    models::{CreateUserRequest, LoginResponse, UpdateUserRequest, User, UserResponse},
    password::{PasswordService, Verification},
    repository::{NewUser, UserRepository},
    token::TokenService,
};

/// Which stored credential a login checks
#[derive(Debug, Clone, Copy)]
enum Credential {
    Password,
    Pin,
}

/// Authentication service coordinating logins and user management
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    token_service: Arc<TokenService>,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, token_service: Arc<TokenService>) -> Self {
        Self {
            user_repo,
            token_service,
        }
    }

    /// Login with username and password
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        self.authenticate(username, password, Credential::Password)
            .await
    }

    /// Login with username and numeric PIN
    pub async fn pin_login(&self, username: &str, pin: &str) -> Result<LoginResponse, AuthError> {
        self.authenticate(username, pin, Credential::Pin).await
    }

    async fn authenticate(
        &self,
        username: &str,
        candidate: &str,
        credential: Credential,
    ) -> Result<LoginResponse, AuthError> {
        let user = self
            .user_repo
            .find_active_by_username(username)
            .await?
            .ok_or_else(|| {
                debug!("Login rejected: unknown or inactive user '{}'", username);
                AuthError::InvalidCredentials
            })?;

        let stored = match credential {
            Credential::Password => user.password_hash.as_str(),
            Credential::Pin => match user.pin_hash.as_deref() {
                Some(pin) if !pin.is_empty() => pin,
                _ => return Err(AuthError::PinNotSet),
            },
        };

        match PasswordService::verify(candidate, stored) {
            Verification::Invalid => {
                debug!("Login rejected: bad {:?} for user_id={}", credential, user.id);
                return Err(AuthError::InvalidCredentials);
            }
            Verification::ValidLegacy => self.upgrade_legacy(&user, candidate, credential).await,
            Verification::Valid => {}
        }

        let token = self
            .token_service
            .generate_access_token(user.id, &user.username, user.role)?;

        info!("User {} logged in ({:?})", user.id, credential);

        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    /// Re-hash a plain-text credential after it matched. Failure is logged only.
    async fn upgrade_legacy(&self, user: &User, candidate: &str, credential: Credential) {
        let hash = match PasswordService::hash_password(candidate) {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Could not hash legacy {:?} for user_id={}: {}", credential, user.id, e);
                return;
            }
        };

        let result = match credential {
            Credential::Password => self.user_repo.set_password_hash(user.id, &hash).await,
            Credential::Pin => self.user_repo.set_pin_hash(user.id, &hash).await.map(|_| ()),
        };

        match result {
            Ok(()) => info!("Upgraded legacy {:?} hash for user_id={}", credential, user.id),
            Err(e) => warn!(
                "Failed to store upgraded {:?} hash for user_id={}: {}",
                credential, user.id, e
            ),
        }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserResponse, AuthError> {
        let password_hash = PasswordService::hash_password(&request.password)?;
        let pin_hash = request
            .pin
            .as_deref()
            .map(PasswordService::hash_password)
            .transpose()?;

        let user = self
            .user_repo
            .create(NewUser {
                username: request.username.trim(),
                password_hash: &password_hash,
                pin_hash: pin_hash.as_deref(),
                first_name: &request.first_name,
                last_name: &request.last_name,
                email: request.email.as_deref(),
                role: request.role,
            })
            .await?;

        info!("Created user {} ({}) with role {}", user.id, user.username, user.role);
        Ok(user.into())
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AuthError> {
        let users = self.user_repo.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_user(&self, id: i32) -> Result<UserResponse, AuthError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound(id))
    }

    pub async fn update_user(
        &self,
        id: i32,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, AuthError> {
        let user = self
            .user_repo
            .update_profile(
                id,
                request.first_name.as_deref(),
                request.last_name.as_deref(),
                request.email.as_deref(),
                request.role,
                request.is_active,
            )
            .await?
            .ok_or(AuthError::UserNotFound(id))?;

        info!("Updated user {}", id);
        Ok(user.into())
    }

    pub async fn update_pin(&self, id: i32, pin: &str) -> Result<(), AuthError> {
        let hash = PasswordService::hash_password(pin)?;
        if !self.user_repo.set_pin_hash(id, &hash).await? {
            return Err(AuthError::UserNotFound(id));
        }
        info!("PIN updated for user {}", id);
        Ok(())
    }
}
