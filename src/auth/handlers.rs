// HTTP handlers for authentication and user management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::auth::{
    middleware::AuthenticatedUser,
    models::{
        CreateUserRequest, LoginRequest, LoginResponse, PinLoginRequest, UpdatePinRequest,
        UpdateUserRequest, UserResponse,
    },
    permissions::Capability,
};
use crate::error::ApiError;
use crate::AppState;

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;
    let response = state
        .auth
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(response))
}

/// Login with username and PIN
#[utoipa::path(
    post,
    path = "/api/v1/auth/pin-login",
    request_body = PinLoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 401, description = "Invalid credentials or no PIN set", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn pin_login(
    State(state): State<AppState>,
    Json(request): Json<PinLoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;
    let response = state.auth.pin_login(&request.username, &request.pin).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses((status = 200, body = [UserResponse])),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    user.require(Capability::ManageUsers)?;
    Ok(Json(state.auth.list_users().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, body = UserResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    user.require(Capability::ManageUsers)?;
    Ok(Json(state.auth.get_user(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, body = UserResponse),
        (status = 400, body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    user.require(Capability::ManageUsers)?;
    request.validate()?;
    let created = state.auth.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, body = UserResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    user.require(Capability::ManageUsers)?;
    request.validate()?;
    Ok(Json(state.auth.update_user(id, request).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/pin",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdatePinRequest,
    responses(
        (status = 204, description = "PIN updated"),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_pin(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdatePinRequest>,
) -> Result<StatusCode, ApiError> {
    user.require(Capability::ManageUsers)?;
    request.validate()?;
    state.auth.update_pin(id, &request.pin).await?;
    Ok(StatusCode::NO_CONTENT)
}
