// HTTP handlers for order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::audit::RequestMeta;
use crate::auth::{AuthenticatedUser, Capability};
use crate::error::ApiError;
use crate::orders::models::{
    CreateOrderRequest, DailyProductSales, DailyRevenue, OrderDetail, OrderListQuery,
    OrderWithStock, PickupRequest, PickupResponse, StatsQuery,
};
use crate::AppState;

/// Price the basket, reserve stock, and store the order as pending
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, body = OrderWithStock),
        (status = 400, body = ErrorResponse),
        (status = 404, description = "Unknown store, sector or product, or no active cost", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderWithStock>), ApiError> {
    user.require(Capability::CreateOrder)?;
    request.validate()?;
    let order = state.orders.create_order(&user, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Newest first; till staff only see their own orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses((status = 200, body = [OrderDetail])),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<OrderDetail>>, ApiError> {
    user.require(Capability::ViewOrders)?;
    Ok(Json(state.orders.list_orders(&user, &query).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, body = OrderDetail),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, ApiError> {
    user.require(Capability::ViewOrders)?;
    Ok(Json(state.orders.get_order(&user, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, body = OrderDetail),
        (status = 400, description = "Order is not pending", body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn mark_paid(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, ApiError> {
    user.require(Capability::SettleOrder)?;
    Ok(Json(state.orders.mark_paid(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/complete",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, body = OrderDetail),
        (status = 400, description = "Order is not paid", body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn mark_completed(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, ApiError> {
    user.require(Capability::SettleOrder)?;
    Ok(Json(state.orders.mark_completed(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, body = OrderWithStock),
        (status = 400, description = "Order is not pending", body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderWithStock>, ApiError> {
    user.require(Capability::SettleOrder)?;
    Ok(Json(state.orders.cancel_order(id).await?))
}

/// Scan-to-collect: codes come from the query string, else from the body
#[utoipa::path(
    put,
    path = "/api/v1/orders/pickup/{order_number}",
    params(("order_number" = String, Path, description = "Order number, any case"), PickupRequest),
    request_body(content = PickupRequest, description = "Codes, when not in the query string"),
    responses(
        (status = 200, body = PickupResponse),
        (status = 404, body = ErrorResponse),
        (status = 409, description = "Code mismatch, not paid, or already picked up", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn pickup_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    Path(order_number): Path<String>,
    Query(query): Query<PickupRequest>,
    body: Option<Json<PickupRequest>>,
) -> Result<Json<PickupResponse>, ApiError> {
    user.require(Capability::SettleOrder)?;

    let request = if query.is_empty() {
        body.map(|Json(body)| body).unwrap_or_default()
    } else {
        query
    };
    debug!("Pickup scan for {}", order_number);

    Ok(Json(
        state
            .orders
            .pickup(&user, &meta, &order_number, &request)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/stats/revenue",
    params(StatsQuery),
    responses((status = 200, body = [DailyRevenue])),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn revenue_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<DailyRevenue>>, ApiError> {
    user.require(Capability::ViewReports)?;
    Ok(Json(state.orders.daily_revenue(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/stats/product-sales",
    params(StatsQuery),
    responses((status = 200, body = [DailyProductSales])),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn product_sales_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<DailyProductSales>>, ApiError> {
    user.require(Capability::ViewReports)?;
    Ok(Json(state.orders.daily_product_sales(&query).await?))
}
