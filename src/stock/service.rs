use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{Connection, PgConnection};
use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, AuditLogger, AuditOutcome, RequestMeta};
use crate::auth::AuthenticatedUser;
use crate::stock::{
    error::StockError,
    ledger::StockLedger,
    models::{
        AdjustStockRequest, AdjustStockResponse, CreateRestockRequest, CreateStoreRequest,
        IncomingStock, LineStockEffect, ReceiveRestockResponse, RestockOrderDetail, RestockQuery,
        StockEffect, StockLevel, StockReportRow, Store,
    },
    repository::StockRepository,
    restock::{RestockStatus, RestockTransitions},
};

/// Reason recorded on audit entries written by restock receipt
pub const RESTOCK_RECEIVED_REASON: &str = "restock_order_received";

/// Direction of an order-driven stock change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Movement {
    Reserve,
    Release,
}

/// Stock ledger, stores, snapshots, and restock orders
#[derive(Clone)]
pub struct StockService {
    repo: StockRepository,
}

impl StockService {
    pub fn new(repo: StockRepository) -> Self {
        Self { repo }
    }

    // ----- stores -----

    pub async fn list_stores(&self) -> Result<Vec<Store>, StockError> {
        self.repo.list_stores().await
    }

    pub async fn create_store(&self, req: CreateStoreRequest) -> Result<Store, StockError> {
        let store = self.repo.create_store(&req).await?;
        info!("Created store {} ({})", store.id, store.name);
        Ok(store)
    }

    // ----- reads -----

    pub async fn list_stock(&self, store_id: Option<i32>) -> Result<Vec<StockLevel>, StockError> {
        self.repo.list_stock(store_id).await
    }

    pub async fn low_stock(&self, store_id: Option<i32>) -> Result<Vec<StockLevel>, StockError> {
        self.repo.low_stock(store_id).await
    }

    pub async fn incoming(&self, store_id: Option<i32>) -> Result<Vec<IncomingStock>, StockError> {
        self.repo.incoming(store_id).await
    }

    pub async fn report(
        &self,
        date: Option<NaiveDate>,
        store_id: Option<i32>,
    ) -> Result<Vec<StockReportRow>, StockError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        debug!("Building stock report for {} store={:?}", date, store_id);
        self.repo.report(date, store_id).await
    }

    // ----- adjust -----

    /// Overwrite the quantity for (product, store) and record the change
    pub async fn adjust(
        &self,
        user: &AuthenticatedUser,
        meta: &RequestMeta,
        product_id: i32,
        store_id: i32,
        req: AdjustStockRequest,
    ) -> Result<AdjustStockResponse, StockError> {
        let mut tx = self.repo.pool().begin().await?;

        if !StockRepository::product_exists(&mut tx, product_id).await? {
            return Err(StockError::ProductNotFound(product_id));
        }
        if !StockRepository::store_exists(&mut tx, store_id).await? {
            return Err(StockError::StoreNotFound(store_id));
        }

        let previous_quantity = StockRepository::lock_stock(&mut tx, product_id, store_id)
            .await?
            .map(|s| s.quantity)
            .unwrap_or(Decimal::ZERO);

        let stock = StockRepository::upsert_quantity(
            &mut tx,
            product_id,
            store_id,
            req.quantity,
            req.low_stock_threshold,
        )
        .await?;

        let entry = AuditEntry::new(
            "stock_update",
            "stock",
            stock.id,
            json!({
                "product_id": product_id,
                "store_id": store_id,
                "old_quantity": previous_quantity,
                "new_quantity": stock.quantity,
                "reason": req.reason,
            }),
        )
        .by(user.user_id)
        .with_meta(meta);
        let audit = AuditLogger::record(&mut tx, &entry).await;

        if let Some(kind) = req.snapshot {
            StockRepository::upsert_snapshot(
                &mut tx,
                Utc::now().date_naive(),
                product_id,
                store_id,
                kind,
                stock.quantity,
                user.user_id,
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            "Stock for product {} at store {} set {} -> {} by user {}",
            product_id, store_id, previous_quantity, stock.quantity, user.user_id
        );

        Ok(AdjustStockResponse {
            stock,
            previous_quantity,
            audit,
        })
    }

    // ----- order-driven movements -----

    /// Take each line's quantity out of the store's stock, flooring at zero
    ///
    /// Lines without a stock row, or whose update fails, are skipped and
    /// reported rather than failing the order.
    pub async fn reserve_for_order(
        conn: &mut PgConnection,
        store_id: i32,
        lines: &[(i32, Decimal)],
    ) -> Vec<LineStockEffect> {
        Self::move_lines(conn, store_id, lines, Movement::Reserve).await
    }

    /// Put each line's quantity back, reversing `reserve_for_order`
    ///
    /// Callers pass what the reservation actually took. Zero-quantity lines
    /// are reported as skipped without touching the stock row.
    pub async fn release_for_order(
        conn: &mut PgConnection,
        store_id: i32,
        lines: &[(i32, Decimal)],
    ) -> Vec<LineStockEffect> {
        Self::move_lines(conn, store_id, lines, Movement::Release).await
    }

    async fn move_lines(
        conn: &mut PgConnection,
        store_id: i32,
        lines: &[(i32, Decimal)],
        movement: Movement,
    ) -> Vec<LineStockEffect> {
        let mut effects = Vec::with_capacity(lines.len());
        for &(product_id, quantity) in lines {
            let effect = Self::move_line(conn, store_id, product_id, quantity, movement).await;
            effects.push(LineStockEffect { product_id, effect });
        }
        effects
    }

    async fn move_line(
        conn: &mut PgConnection,
        store_id: i32,
        product_id: i32,
        quantity: Decimal,
        movement: Movement,
    ) -> StockEffect {
        if movement == Movement::Release && quantity <= Decimal::ZERO {
            debug!(
                "Nothing reserved for product {} at store {}, leaving stock alone",
                product_id, store_id
            );
            return StockEffect::Skipped {
                reason: format!(
                    "product {} at store {}: nothing reserved",
                    product_id, store_id
                ),
            };
        }

        let mut savepoint = match conn.begin().await {
            Ok(savepoint) => savepoint,
            Err(e) => return Self::skipped(product_id, store_id, e.to_string()),
        };

        let result = async {
            let Some(stock) = StockRepository::lock_stock(&mut savepoint, product_id, store_id).await?
            else {
                return Ok(None);
            };
            let target = match movement {
                Movement::Reserve => StockLedger::reserve(stock.quantity, quantity),
                Movement::Release => StockLedger::release(stock.quantity, quantity),
            };
            let updated = StockRepository::update_quantity(&mut savepoint, stock.id, target).await?;
            Ok::<_, StockError>(Some((stock.quantity, updated.quantity)))
        }
        .await;

        match result {
            Ok(Some((previous, current))) => match savepoint.commit().await {
                Ok(()) => StockEffect::Applied { previous, current },
                Err(e) => Self::skipped(product_id, store_id, e.to_string()),
            },
            Ok(None) => {
                if let Err(rollback_err) = savepoint.rollback().await {
                    warn!("Stock savepoint rollback failed: {}", rollback_err);
                }
                Self::skipped(product_id, store_id, "no stock row".to_string())
            }
            Err(e) => {
                if let Err(rollback_err) = savepoint.rollback().await {
                    warn!("Stock savepoint rollback failed: {}", rollback_err);
                }
                Self::skipped(product_id, store_id, e.to_string())
            }
        }
    }

    fn skipped(product_id: i32, store_id: i32, reason: String) -> StockEffect {
        warn!(
            "Skipping stock movement for product {} at store {}: {}",
            product_id, store_id, reason
        );
        StockEffect::Skipped {
            reason: format!(
                "product {} at store {}: {}",
                product_id, store_id, reason
            ),
        }
    }

    // ----- restock -----

    pub async fn list_restock(
        &self,
        query: &RestockQuery,
    ) -> Result<Vec<RestockOrderDetail>, StockError> {
        self.repo.list_restock(query).await
    }

    pub async fn create_restock(
        &self,
        user: &AuthenticatedUser,
        req: CreateRestockRequest,
    ) -> Result<RestockOrderDetail, StockError> {
        let mut tx = self.repo.pool().begin().await?;

        if !StockRepository::store_exists(&mut tx, req.store_id).await? {
            return Err(StockError::StoreNotFound(req.store_id));
        }

        let order =
            StockRepository::insert_restock(&mut tx, req.store_id, req.notes.as_deref(), user.user_id)
                .await?;

        let mut items = Vec::with_capacity(req.items.len());
        for item in &req.items {
            if !StockRepository::product_exists(&mut tx, item.product_id).await? {
                return Err(StockError::ProductNotFound(item.product_id));
            }
            items.push(StockRepository::insert_restock_item(&mut tx, order.id, item).await?);
        }

        tx.commit().await?;
        info!(
            "Restock order {} created for store {} with {} lines",
            order.id,
            order.store_id,
            items.len()
        );

        Ok(RestockOrderDetail { order, items })
    }

    pub async fn set_tracking(
        &self,
        id: i32,
        tracking_number: &str,
    ) -> Result<RestockOrderDetail, StockError> {
        let mut tx = self.repo.pool().begin().await?;
        let order = StockRepository::lock_restock(&mut tx, id)
            .await?
            .ok_or(StockError::RestockNotFound(id))?;

        RestockTransitions::transition(order.status, RestockStatus::InTransit)
            .map_err(StockError::InvalidTransition)?;

        let order = StockRepository::set_tracking(&mut tx, id, tracking_number, Utc::now()).await?;
        let items = StockRepository::restock_items(&mut tx, id).await?;
        tx.commit().await?;

        info!("Restock order {} in transit ({})", id, tracking_number);
        Ok(RestockOrderDetail { order, items })
    }

    /// Book every line of the shipment into the store's stock
    pub async fn receive(
        &self,
        user: &AuthenticatedUser,
        meta: &RequestMeta,
        id: i32,
    ) -> Result<ReceiveRestockResponse, StockError> {
        let mut tx = self.repo.pool().begin().await?;
        let order = StockRepository::lock_restock(&mut tx, id)
            .await?
            .ok_or(StockError::RestockNotFound(id))?;

        RestockTransitions::transition(order.status, RestockStatus::Received)
            .map_err(StockError::InvalidTransition)?;

        let items = StockRepository::restock_items(&mut tx, id).await?;
        let mut stock_effects = Vec::with_capacity(items.len());
        let mut audit: Vec<AuditOutcome> = Vec::with_capacity(items.len());

        for item in &items {
            let existing = StockRepository::lock_stock(&mut tx, item.product_id, order.store_id).await?;
            let previous = existing.as_ref().map(|s| s.quantity).unwrap_or(Decimal::ZERO);
            let target = StockLedger::release(previous, item.quantity);

            let stock = match existing {
                Some(stock) => StockRepository::update_quantity(&mut tx, stock.id, target).await?,
                None => {
                    StockRepository::upsert_quantity(
                        &mut tx,
                        item.product_id,
                        order.store_id,
                        target,
                        None,
                    )
                    .await?
                }
            };

            let entry = AuditEntry::new(
                "stock_update",
                "stock",
                stock.id,
                json!({
                    "product_id": item.product_id,
                    "store_id": order.store_id,
                    "old_quantity": previous,
                    "new_quantity": stock.quantity,
                    "reason": RESTOCK_RECEIVED_REASON,
                    "restock_order_id": id,
                }),
            )
            .by(user.user_id)
            .with_meta(meta);
            audit.push(AuditLogger::record(&mut tx, &entry).await);

            stock_effects.push(LineStockEffect {
                product_id: item.product_id,
                effect: StockEffect::Applied {
                    previous,
                    current: stock.quantity,
                },
            });
        }

        let order =
            StockRepository::set_restock_status(&mut tx, id, RestockStatus::Received, Utc::now())
                .await?;
        tx.commit().await?;

        info!(
            "Restock order {} received into store {} ({} lines)",
            id,
            order.store_id,
            items.len()
        );

        Ok(ReceiveRestockResponse {
            order: RestockOrderDetail { order, items },
            stock_effects,
            audit,
        })
    }

    pub async fn cancel_restock(&self, id: i32) -> Result<RestockOrderDetail, StockError> {
        let mut tx = self.repo.pool().begin().await?;
        let order = StockRepository::lock_restock(&mut tx, id)
            .await?
            .ok_or(StockError::RestockNotFound(id))?;

        RestockTransitions::transition(order.status, RestockStatus::Cancelled)
            .map_err(StockError::InvalidTransition)?;

        let order =
            StockRepository::set_restock_status(&mut tx, id, RestockStatus::Cancelled, Utc::now())
                .await?;
        let items = StockRepository::restock_items(&mut tx, id).await?;
        tx.commit().await?;

        info!("Restock order {} cancelled", id);
        Ok(RestockOrderDetail { order, items })
    }
}
