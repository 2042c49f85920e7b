// HTTP handlers for till devices

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::auth::{AuthenticatedUser, Capability};
use crate::devices::models::{Device, DeviceInfo, RegisterDeviceRequest};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DeviceQuery {
    pub store_id: Option<i32>,
}

/// Resolve a till to its store. Tills call this before any user has logged in.
#[utoipa::path(
    get,
    path = "/api/v1/device/{device_code}",
    params(("device_code" = String, Path, description = "Device code, braces optional")),
    responses(
        (status = 200, body = DeviceInfo),
        (status = 404, body = ErrorResponse)
    ),
    tag = "devices"
)]
pub async fn lookup_device(
    State(state): State<AppState>,
    Path(device_code): Path<String>,
) -> Result<Json<DeviceInfo>, ApiError> {
    Ok(Json(state.devices.lookup(&device_code).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/devices",
    request_body = RegisterDeviceRequest,
    responses(
        (status = 201, body = Device),
        (status = 400, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "devices"
)]
pub async fn register_device(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    user.require(Capability::ManageStores)?;
    request.validate()?;
    let device = state.devices.register(request).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices",
    params(DeviceQuery),
    responses((status = 200, body = [Device])),
    security(("bearer_auth" = [])),
    tag = "devices"
)]
pub async fn list_devices(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<DeviceQuery>,
) -> Result<Json<Vec<Device>>, ApiError> {
    user.require(Capability::ManageStores)?;
    Ok(Json(state.devices.list(query.store_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/{id}",
    params(("id" = i32, Path, description = "Device ID")),
    responses(
        (status = 200, body = Device),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "devices"
)]
pub async fn get_device(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<Device>, ApiError> {
    user.require(Capability::ManageStores)?;
    Ok(Json(state.devices.get(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores/{store_id}/devices",
    params(("store_id" = i32, Path, description = "Store ID")),
    responses((status = 200, body = [Device])),
    security(("bearer_auth" = [])),
    tag = "devices"
)]
pub async fn store_devices(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(store_id): Path<i32>,
) -> Result<Json<Vec<Device>>, ApiError> {
    user.require(Capability::ManageStores)?;
    Ok(Json(state.devices.list(Some(store_id)).await?))
}
