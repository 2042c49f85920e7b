// HTTP handlers for audit trail queries

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

use crate::audit::models::{AuditLog, OrderAuditQuery, StockAuditQuery};
use crate::auth::{AuthenticatedUser, Capability};
use crate::error::ApiError;
use crate::AppState;

/// Stock adjustments for a stock row, a product, or a store
#[utoipa::path(
    get,
    path = "/api/v1/audit/stock",
    params(StockAuditQuery),
    responses(
        (status = 200, body = [AuditLog]),
        (status = 400, description = "No filter supplied", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "audit"
)]
pub async fn stock_audit(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<StockAuditQuery>,
) -> Result<Json<Vec<AuditLog>>, ApiError> {
    user.require(Capability::ViewAudit)?;
    debug!("Stock audit query: {:?}", query);

    let logs = match (query.entity_id.as_deref(), query.product_id, query.store_id) {
        (Some(entity_id), _, _) => {
            state
                .audit
                .find_for_entity("stock", entity_id, Some("stock_update"))
                .await?
        }
        (None, Some(product_id), Some(store_id)) => {
            match state.audit.stock_id(product_id, store_id).await? {
                Some(stock_id) => {
                    state
                        .audit
                        .find_for_entity("stock", &stock_id.to_string(), Some("stock_update"))
                        .await?
                }
                None => Vec::new(),
            }
        }
        (None, Some(product_id), None) => state.audit.find_stock_for_product(product_id).await?,
        (None, None, Some(store_id)) => state.audit.find_stock_for_store(store_id).await?,
        (None, None, None) => {
            return Err(ApiError::InvalidInput(
                "product_id, store_id, or entity_id is required".to_string(),
            ))
        }
    };

    Ok(Json(logs))
}

/// Audit entries recorded against an order
#[utoipa::path(
    get,
    path = "/api/v1/audit/order",
    params(OrderAuditQuery),
    responses(
        (status = 200, body = [AuditLog]),
        (status = 400, description = "No filter supplied", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "audit"
)]
pub async fn order_audit(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<OrderAuditQuery>,
) -> Result<Json<Vec<AuditLog>>, ApiError> {
    user.require(Capability::ViewAudit)?;

    let entity_id = query
        .entity_id
        .or(query.order_id)
        .ok_or_else(|| ApiError::InvalidInput("order_id or entity_id is required".to_string()))?;

    let logs = state.audit.find_for_entity("order", &entity_id, None).await?;
    Ok(Json(logs))
}
