// HTTP handlers for quotes and sector catalogs

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::auth::{AuthenticatedUser, Capability};
use crate::error::ApiError;
use crate::pricing::models::{QuoteRequest, QuoteResponse, SectorCatalog};
use crate::AppState;

/// Price a basket for an optional sector without creating an order
#[utoipa::path(
    post,
    path = "/api/v1/pricing/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, body = QuoteResponse),
        (status = 400, body = ErrorResponse),
        (status = 404, description = "Unknown product or sector, or product has no cost", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "pricing"
)]
pub async fn quote(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    request.validate()?;
    Ok(Json(state.pricing.quote(&request).await?))
}

/// Priced catalog of every costed product for a sector
#[utoipa::path(
    get,
    path = "/api/v1/catalogs/{sector_id}",
    params(("sector_id" = i32, Path, description = "Sector ID")),
    responses(
        (status = 200, body = SectorCatalog),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "pricing"
)]
pub async fn sector_catalog(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(sector_id): Path<i32>,
) -> Result<Json<SectorCatalog>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    Ok(Json(state.pricing.sector_catalog(sector_id).await?))
}
