// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_pin;

/// Staff role stored on the user row and carried in the JWT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Management,
    Supervisor,
    PosUser,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Management => "management",
            Role::Supervisor => "supervisor",
            Role::PosUser => "pos_user",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::PosUser
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub pin_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User response model (credentials stripped)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub has_pin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            has_pin: user.pin_hash.as_deref().map_or(false, |h| !h.is_empty()),
            created_at: user.created_at,
        }
    }
}

/// Password login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// PIN login request used on shared tills
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PinLoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(custom = "validate_pin")]
    pub pin: String,
}

/// Successful login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(custom = "validate_pin")]
    pub pin: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePinRequest {
    #[validate(custom = "validate_pin")]
    pub pin: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(pin_hash: Option<&str>) -> User {
        User {
            id: 7,
            username: "till1".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            pin_hash: pin_hash.map(str::to_string),
            first_name: "Ada".to_string(),
            last_name: "Wong".to_string(),
            email: None,
            role: Role::PosUser,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::PosUser).unwrap(), "\"pos_user\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"management\"").unwrap(),
            Role::Management
        );
        assert_eq!(Role::Supervisor.to_string(), "supervisor");
    }

    #[test]
    fn test_user_response_strips_credentials() {
        let response = UserResponse::from(sample_user(Some("1234")));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("pin_hash").is_none());
        assert_eq!(json["has_pin"], true);
    }

    #[test]
    fn test_user_without_pin() {
        assert!(!UserResponse::from(sample_user(None)).has_pin);
        assert!(!UserResponse::from(sample_user(Some(""))).has_pin);
    }

    #[test]
    fn test_pin_login_validation() {
        let ok = PinLoginRequest { username: "till1".into(), pin: "4321".into() };
        assert!(ok.validate().is_ok());

        let bad = PinLoginRequest { username: "till1".into(), pin: "43".into() };
        assert!(bad.validate().is_err());
    }
}
