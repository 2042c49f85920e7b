// Database repository for staff users

use sqlx::PgPool;

use crate::auth::{
    error::AuthError,
    models::{Role, User},
};

const USER_COLUMNS: &str = "id, username, password_hash, pin_hash, first_name, last_name, \
                            email, role, is_active, created_at, updated_at";

/// Fields accepted when creating a user
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub pin_hash: Option<&'a str>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a str>,
    pub role: Role,
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: NewUser<'_>) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, pin_hash, first_name, last_name, email, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.pin_hash)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.email)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::UsernameAlreadyExists;
                }
            }
            AuthError::DatabaseError(e)
        })
    }

    /// Find an active user by username (case-insensitive)
    pub async fn find_active_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1) AND is_active"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AuthError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Update profile fields; `None` keeps the stored value
    pub async fn update_profile(
        &self,
        id: i32,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: Option<&str>,
        role: Option<Role>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                email      = COALESCE($4, email),
                role       = COALESCE($5, role),
                is_active  = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(role)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn set_password_hash(&self, id: i32, hash: &str) -> Result<(), AuthError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns false when no such user exists
    pub async fn set_pin_hash(&self, id: i32, hash: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("UPDATE users SET pin_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
