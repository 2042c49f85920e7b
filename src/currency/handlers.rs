// HTTP handlers for currency rates

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::auth::{AuthenticatedUser, Capability};
use crate::currency::models::{
    CreateRateRequest, CurrencyRate, PinRequest, SyncResponse, UpdateRateRequest,
};
use crate::error::ApiError;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/currency-rates",
    responses((status = 200, description = "Pinned rates first", body = [CurrencyRate])),
    security(("bearer_auth" = [])),
    tag = "currency"
)]
pub async fn list_rates(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<CurrencyRate>>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    Ok(Json(state.currency.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/currency-rates/{code}",
    params(("code" = String, Path, description = "Currency code")),
    responses(
        (status = 200, body = CurrencyRate),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "currency"
)]
pub async fn get_rate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(code): Path<String>,
) -> Result<Json<CurrencyRate>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    Ok(Json(state.currency.get(&code).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/currency-rates",
    request_body = CreateRateRequest,
    responses(
        (status = 201, body = CurrencyRate),
        (status = 400, body = ErrorResponse),
        (status = 409, description = "Rate already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "currency"
)]
pub async fn create_rate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateRateRequest>,
) -> Result<(StatusCode, Json<CurrencyRate>), ApiError> {
    user.require(Capability::ManageCurrency)?;
    request.validate()?;
    let rate = state.currency.create(request).await?;
    Ok((StatusCode::CREATED, Json(rate)))
}

#[utoipa::path(
    put,
    path = "/api/v1/currency-rates/{code}",
    params(("code" = String, Path, description = "Currency code")),
    request_body = UpdateRateRequest,
    responses(
        (status = 200, body = CurrencyRate),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "currency"
)]
pub async fn update_rate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(code): Path<String>,
    Json(request): Json<UpdateRateRequest>,
) -> Result<Json<CurrencyRate>, ApiError> {
    user.require(Capability::ManageCurrency)?;
    request.validate()?;
    Ok(Json(state.currency.update(&code, request).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/currency-rates/{code}/pin",
    params(("code" = String, Path, description = "Currency code")),
    request_body = PinRequest,
    responses(
        (status = 200, body = CurrencyRate),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "currency"
)]
pub async fn pin_rate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(code): Path<String>,
    Json(request): Json<PinRequest>,
) -> Result<Json<CurrencyRate>, ApiError> {
    user.require(Capability::ManageCurrency)?;
    Ok(Json(state.currency.set_pinned(&code, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/currency-rates/{code}",
    params(("code" = String, Path, description = "Currency code")),
    responses(
        (status = 204, description = "Rate deleted"),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "currency"
)]
pub async fn delete_rate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Capability::ManageCurrency)?;
    state.currency.delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pull rates from the configured feed
#[utoipa::path(
    post,
    path = "/api/v1/currency-rates/sync",
    responses(
        (status = 200, body = SyncResponse),
        (status = 502, description = "Feed unreachable or unreadable", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "currency"
)]
pub async fn sync_rates(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<SyncResponse>, ApiError> {
    user.require(Capability::ManageCurrency)?;
    Ok(Json(state.currency.sync().await?))
}
