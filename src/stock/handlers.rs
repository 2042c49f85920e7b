// HTTP handlers for stores, stock levels, and restock orders

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use validator::Validate;

use crate::audit::RequestMeta;
use crate::auth::{AuthenticatedUser, Capability};
use crate::error::ApiError;
use crate::stock::models::{
    AdjustStockRequest, AdjustStockResponse, CreateRestockRequest, CreateStoreRequest,
    IncomingStock, ReceiveRestockResponse, RestockOrderDetail, RestockQuery, StockLevel,
    StockQuery, StockReportQuery, StockReportRow, Store, TrackingRequest,
};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/stores",
    responses((status = 200, body = [Store])),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn list_stores(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Store>>, ApiError> {
    user.require(Capability::ViewStock)?;
    Ok(Json(state.stock.list_stores().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/stores",
    request_body = CreateStoreRequest,
    responses(
        (status = 201, body = Store),
        (status = 400, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn create_store(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<Store>), ApiError> {
    user.require(Capability::ManageStores)?;
    request.validate()?;
    let store = state.stock.create_store(request).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stock",
    params(StockQuery),
    responses((status = 200, body = [StockLevel])),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn list_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<StockQuery>,
) -> Result<Json<Vec<StockLevel>>, ApiError> {
    user.require(Capability::ViewStock)?;
    debug!("Listing stock, store={:?}", query.store_id);
    Ok(Json(state.stock.list_stock(query.store_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/stock/store/{store_id}",
    params(("store_id" = i32, Path, description = "Store ID")),
    responses((status = 200, body = [StockLevel])),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn store_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(store_id): Path<i32>,
) -> Result<Json<Vec<StockLevel>>, ApiError> {
    user.require(Capability::ViewStock)?;
    Ok(Json(state.stock.list_stock(Some(store_id)).await?))
}

/// Rows at or below their low-stock threshold
#[utoipa::path(
    get,
    path = "/api/v1/stock/low-stock",
    params(StockQuery),
    responses((status = 200, body = [StockLevel])),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<StockQuery>,
) -> Result<Json<Vec<StockLevel>>, ApiError> {
    user.require(Capability::ViewStock)?;
    Ok(Json(state.stock.low_stock(query.store_id).await?))
}

/// Quantities on restock orders not yet received
#[utoipa::path(
    get,
    path = "/api/v1/stock/incoming",
    params(StockQuery),
    responses((status = 200, body = [IncomingStock])),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn incoming_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<StockQuery>,
) -> Result<Json<Vec<IncomingStock>>, ApiError> {
    user.require(Capability::ViewStock)?;
    Ok(Json(state.stock.incoming(query.store_id).await?))
}

/// Overwrite the quantity held for a product at a store
#[utoipa::path(
    put,
    path = "/api/v1/stock/{product_id}/{store_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
        ("store_id" = i32, Path, description = "Store ID")
    ),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, body = AdjustStockResponse),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path((product_id, store_id)): Path<(i32, i32)>,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<AdjustStockResponse>, ApiError> {
    user.require(Capability::AdjustStock)?;
    request.validate()?;
    let response = state
        .stock
        .adjust(&user, &meta, product_id, store_id, request)
        .await?;
    Ok(Json(response))
}

/// Day-start and day-end counts for one day
#[utoipa::path(
    get,
    path = "/api/v1/stock/report",
    params(StockReportQuery),
    responses((status = 200, body = [StockReportRow])),
    security(("bearer_auth" = [])),
    tag = "stock"
)]
pub async fn stock_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<StockReportQuery>,
) -> Result<Json<Vec<StockReportRow>>, ApiError> {
    user.require(Capability::ViewReports)?;
    Ok(Json(state.stock.report(query.date, query.store_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/restock-orders",
    params(RestockQuery),
    responses((status = 200, body = [RestockOrderDetail])),
    security(("bearer_auth" = [])),
    tag = "restock"
)]
pub async fn list_restock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<RestockQuery>,
) -> Result<Json<Vec<RestockOrderDetail>>, ApiError> {
    user.require(Capability::ViewStock)?;
    Ok(Json(state.stock.list_restock(&query).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/restock-orders",
    request_body = CreateRestockRequest,
    responses(
        (status = 201, body = RestockOrderDetail),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "restock"
)]
pub async fn create_restock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateRestockRequest>,
) -> Result<(StatusCode, Json<RestockOrderDetail>), ApiError> {
    user.require(Capability::ManageRestock)?;
    request.validate()?;
    let order = state.stock.create_restock(&user, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    put,
    path = "/api/v1/restock-orders/{id}/tracking",
    params(("id" = i32, Path, description = "Restock order ID")),
    request_body = TrackingRequest,
    responses(
        (status = 200, body = RestockOrderDetail),
        (status = 400, description = "Order already received or cancelled", body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "restock"
)]
pub async fn set_tracking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<TrackingRequest>,
) -> Result<Json<RestockOrderDetail>, ApiError> {
    user.require(Capability::ManageRestock)?;
    request.validate()?;
    Ok(Json(state.stock.set_tracking(id, &request.tracking_number).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/restock-orders/{id}/receive",
    params(("id" = i32, Path, description = "Restock order ID")),
    responses(
        (status = 200, body = ReceiveRestockResponse),
        (status = 400, description = "Order already received or cancelled", body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "restock"
)]
pub async fn receive_restock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(id): Path<i32>,
) -> Result<Json<ReceiveRestockResponse>, ApiError> {
    user.require(Capability::ManageRestock)?;
    Ok(Json(state.stock.receive(&user, &meta, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/restock-orders/{id}/cancel",
    params(("id" = i32, Path, description = "Restock order ID")),
    responses(
        (status = 200, body = RestockOrderDetail),
        (status = 400, description = "Order already received or cancelled", body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "restock"
)]
pub async fn cancel_restock(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<RestockOrderDetail>, ApiError> {
    user.require(Capability::ManageRestock)?;
    Ok(Json(state.stock.cancel_restock(id).await?))
}
