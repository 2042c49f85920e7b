use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::json;
use sqlx::Connection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditLogger, RequestMeta};
use crate::auth::AuthenticatedUser;
use crate::catalog::CatalogRepository;
use crate::orders::{
    check_code::{CheckCode, OrderNumber},
    error::OrderError,
    models::{
        CreateOrderRequest, DailyProductSales, DailyRevenue, OrderDetail, OrderListQuery,
        OrderStatus, OrderWithStock, PickupRequest, PickupResponse, StatsQuery,
    },
    repository::{NewOrder, OrderRepository},
    status_machine::StatusMachine,
};
use crate::pricing::{engine::LinePrice, PricingService};
use crate::stock::StockService;

/// Attempts at a unique order number before giving up
pub const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 5;

/// Round to the 4 decimal places money columns hold
fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

fn stored_line(line: &LinePrice) -> LinePrice {
    LinePrice {
        unit_price: money(line.unit_price),
        discount_amount: money(line.discount_amount),
        line_total: money(line.line_total),
        ..line.clone()
    }
}

/// Service for the order lifecycle and sales reports
#[derive(Clone)]
pub struct OrderService {
    repo: OrderRepository,
}

impl OrderService {
    pub fn new(repo: OrderRepository) -> Self {
        Self { repo }
    }

    /// Create a new order
    ///
    /// Everything happens in one transaction:
    /// - every line is priced against the cost and discount rows in force now
    /// - the order gets a unique number and its two check codes
    /// - stock is reserved line by line; lines that cannot be reserved are
    ///   reported in `stock_effects` and do not fail the order
    /// - items, with the quantity each one actually took from stock, and one
    ///   price history row per line are written
    pub async fn create_order(
        &self,
        user: &AuthenticatedUser,
        request: CreateOrderRequest,
    ) -> Result<OrderWithStock, OrderError> {
        let mut tx = self.repo.pool().begin().await?;
        let now = Utc::now();

        if !OrderRepository::store_exists(&mut tx, request.store_id).await? {
            return Err(OrderError::StoreNotFound(request.store_id));
        }

        let sector = PricingService::load_sector(&mut tx, request.sector_id).await?;
        let (lines, totals) =
            PricingService::price_lines(&mut tx, sector.as_ref(), &request.items, now).await?;

        let subtotal = money(totals.subtotal);
        let discount_amount = money(totals.discount_amount);
        let total_amount = money(totals.total);

        let mut created = None;
        for attempt in 0..MAX_ORDER_NUMBER_ATTEMPTS {
            let order_number = if attempt == 0 {
                OrderNumber::from_clock(now)
            } else {
                OrderNumber::random(now)
            };
            let (invoice_check_code, receipt_check_code) =
                CheckCode::pair(&order_number, total_amount);

            let new_order = NewOrder {
                order_number: &order_number,
                store_id: request.store_id,
                user_id: user.user_id,
                device_code: request.device_code.as_deref(),
                sector_id: request.sector_id,
                subtotal,
                discount_amount,
                total_amount,
                invoice_check_code: &invoice_check_code,
                receipt_check_code: &receipt_check_code,
                created_at: now,
            };

            // A collision must not abort the surrounding transaction
            let mut savepoint = tx.begin().await?;
            match OrderRepository::insert_order(&mut savepoint, &new_order).await {
                Ok(order) => {
                    savepoint.commit().await?;
                    created = Some(order);
                    break;
                }
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    savepoint.rollback().await?;
                    warn!(
                        "Order number {} already taken (attempt {}), retrying",
                        order_number,
                        attempt + 1
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        let order = created.ok_or(OrderError::OrderNumberExhausted(MAX_ORDER_NUMBER_ATTEMPTS))?;

        let movements: Vec<(i32, Decimal)> =
            lines.iter().map(|l| (l.product_id, l.quantity)).collect();
        let stock_effects = StockService::reserve_for_order(&mut tx, order.store_id, &movements).await;

        // Effects come back in line order
        for (line, stock) in lines.iter().zip(&stock_effects) {
            let line = stored_line(line);
            OrderRepository::insert_item(&mut tx, order.id, &line, stock.effect.taken()).await?;
            CatalogRepository::append_price_history(
                &mut tx,
                line.product_id,
                request.sector_id,
                line.base_price,
                line.discount_percent,
                line.unit_price,
            )
            .await?;
        }

        let items = OrderRepository::items(&mut tx, order.id).await?;
        tx.commit().await?;

        info!(
            "Order {} created by user {} at store {}: total {} ({} lines)",
            order.order_number,
            user.user_id,
            order.store_id,
            order.total_amount,
            items.len()
        );

        Ok(OrderWithStock {
            detail: OrderDetail { order, items },
            stock_effects,
        })
    }

    pub async fn get_order(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<OrderDetail, OrderError> {
        let detail = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| OrderError::not_found(id))?;

        if user.role.sees_only_own_orders() && detail.order.user_id != user.user_id {
            debug!("User {} asked for order {} of another user", user.user_id, id);
            return Err(OrderError::not_found(id));
        }
        Ok(detail)
    }

    pub async fn list_orders(
        &self,
        user: &AuthenticatedUser,
        query: &OrderListQuery,
    ) -> Result<Vec<OrderDetail>, OrderError> {
        let only_user = user.role.sees_only_own_orders().then_some(user.user_id);
        debug!("Listing orders {:?} only_user={:?}", query, only_user);
        self.repo.list(query, only_user).await
    }

    /// pending → paid; repeating it on a paid order keeps the first `paid_at`
    pub async fn mark_paid(&self, id: Uuid) -> Result<OrderDetail, OrderError> {
        let mut tx = self.repo.pool().begin().await?;
        let order = OrderRepository::lock_order(&mut tx, id)
            .await?
            .ok_or_else(|| OrderError::not_found(id))?;

        StatusMachine::transition(order.status, OrderStatus::Paid)?;
        let order = OrderRepository::mark_paid(&mut tx, id, Utc::now()).await?;
        let items = OrderRepository::items(&mut tx, id).await?;
        tx.commit().await?;

        info!("Order {} marked paid", order.order_number);
        Ok(OrderDetail { order, items })
    }

    /// paid → completed
    pub async fn mark_completed(&self, id: Uuid) -> Result<OrderDetail, OrderError> {
        let mut tx = self.repo.pool().begin().await?;
        let order = OrderRepository::lock_order(&mut tx, id)
            .await?
            .ok_or_else(|| OrderError::not_found(id))?;

        StatusMachine::transition(order.status, OrderStatus::Completed)?;
        let order = OrderRepository::mark_completed(&mut tx, id, Utc::now()).await?;
        let items = OrderRepository::items(&mut tx, id).await?;
        tx.commit().await?;

        info!("Order {} completed", order.order_number);
        Ok(OrderDetail { order, items })
    }

    /// pending → cancelled, giving back exactly what each line took from stock
    pub async fn cancel_order(&self, id: Uuid) -> Result<OrderWithStock, OrderError> {
        let mut tx = self.repo.pool().begin().await?;
        let order = OrderRepository::lock_order(&mut tx, id)
            .await?
            .ok_or_else(|| OrderError::not_found(id))?;

        StatusMachine::transition(order.status, OrderStatus::Cancelled)?;

        let items = OrderRepository::items(&mut tx, id).await?;
        let movements: Vec<(i32, Decimal)> =
            items.iter().map(|i| (i.product_id, i.reserved_quantity)).collect();
        let stock_effects = StockService::release_for_order(&mut tx, order.store_id, &movements).await;

        let order = OrderRepository::mark_cancelled(&mut tx, id, Utc::now()).await?;
        tx.commit().await?;

        info!("Order {} cancelled, stock restored", order.order_number);
        Ok(OrderWithStock {
            detail: OrderDetail { order, items },
            stock_effects,
        })
    }

    /// Hand an order over at the counter, keyed by the scanned order number
    pub async fn pickup(
        &self,
        user: &AuthenticatedUser,
        meta: &RequestMeta,
        order_number: &str,
        request: &PickupRequest,
    ) -> Result<PickupResponse, OrderError> {
        let mut tx = self.repo.pool().begin().await?;
        let order = OrderRepository::lock_by_number(&mut tx, order_number.trim())
            .await?
            .ok_or_else(|| OrderError::NotFound(order_number.to_string()))?;

        debug!(
            "Pickup requested for {} (status={}, paid_at={:?}, picked_up_at={:?})",
            order.order_number, order.status, order.paid_at, order.picked_up_at
        );
        StatusMachine::check_pickup(&order, request)?;

        let now = Utc::now();
        let order = OrderRepository::mark_picked_up(&mut tx, order.id, now).await?;

        let entry = AuditEntry::new(
            "order_pickup",
            "order",
            order.id,
            json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "status": OrderStatus::PickedUp,
                "picked_up_at": now.to_rfc3339(),
            }),
        )
        .by(user.user_id)
        .with_meta(meta);
        let audit = AuditLogger::record(&mut tx, &entry).await;

        let items = OrderRepository::items(&mut tx, order.id).await?;
        tx.commit().await?;

        info!("Order {} picked up by user {}", order.order_number, user.user_id);
        Ok(PickupResponse {
            order: OrderDetail { order, items },
            audit,
        })
    }

    pub async fn daily_revenue(&self, query: &StatsQuery) -> Result<Vec<DailyRevenue>, OrderError> {
        let (start, end) = query.date_range(Utc::now().date_naive());
        debug!("Revenue stats {}..={} store={:?}", start, end, query.store_id);
        self.repo.daily_revenue(start, end, query.store_id).await
    }

    pub async fn daily_product_sales(
        &self,
        query: &StatsQuery,
    ) -> Result<Vec<DailyProductSales>, OrderError> {
        let (start, end) = query.date_range(Utc::now().date_naive());
        debug!("Product sales stats {}..={} store={:?}", start, end, query.store_id);
        self.repo.daily_product_sales(start, end, query.store_id).await
    }
}
