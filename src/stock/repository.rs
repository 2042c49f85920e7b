use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::stock::{
    error::StockError,
    models::{
        CreateStoreRequest, IncomingStock, RestockItemRequest, RestockOrder, RestockOrderDetail,
        RestockOrderItem, RestockQuery, SnapshotKind, Stock, StockLevel, StockReportRow, Store,
    },
    restock::RestockStatus,
};

const STORE_COLUMNS: &str = "id, name, address, is_active, created_at, updated_at";

const STOCK_COLUMNS: &str = "id, product_id, store_id, quantity, low_stock_threshold, updated_at";

const STOCK_LEVEL_SELECT: &str = r#"
    SELECT s.id, s.product_id, p.name AS product_name, s.store_id, st.name AS store_name,
           s.quantity, s.low_stock_threshold, s.updated_at
    FROM stock s
    JOIN products p ON p.id = s.product_id
    JOIN stores st ON st.id = s.store_id
"#;

const RESTOCK_COLUMNS: &str = "id, store_id, status, tracking_number, notes, created_by, \
    created_at, updated_at, shipped_at, received_at";

/// Repository for stores, stock rows, day snapshots, and restock orders
///
/// Stock mutations are associated functions on a `PgConnection` so they
/// always run inside the caller's transaction.
#[derive(Clone)]
pub struct StockRepository {
    pool: PgPool,
}

impl StockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ----- stores -----

    pub async fn list_stores(&self) -> Result<Vec<Store>, StockError> {
        let stores = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE is_active ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(stores)
    }

    pub async fn create_store(&self, req: &CreateStoreRequest) -> Result<Store, StockError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "INSERT INTO stores (name, address) VALUES ($1, $2) RETURNING {STORE_COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(store)
    }

    pub async fn store_exists(conn: &mut PgConnection, id: i32) -> Result<bool, StockError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }

    pub async fn product_exists(conn: &mut PgConnection, id: i32) -> Result<bool, StockError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(id)
                .fetch_one(conn)
                .await?;
        Ok(exists)
    }

    // ----- stock reads -----

    pub async fn list_stock(&self, store_id: Option<i32>) -> Result<Vec<StockLevel>, StockError> {
        let rows = sqlx::query_as::<_, StockLevel>(&format!(
            r#"
            {STOCK_LEVEL_SELECT}
            WHERE ($1::int IS NULL OR s.store_id = $1)
            ORDER BY st.name, p.name
            "#
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Rows at or below their low-stock threshold
    pub async fn low_stock(&self, store_id: Option<i32>) -> Result<Vec<StockLevel>, StockError> {
        let rows = sqlx::query_as::<_, StockLevel>(&format!(
            r#"
            {STOCK_LEVEL_SELECT}
            WHERE s.quantity <= s.low_stock_threshold
              AND ($1::int IS NULL OR s.store_id = $1)
            ORDER BY st.name, p.name
            "#
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Quantities on restock orders that have not arrived yet
    pub async fn incoming(&self, store_id: Option<i32>) -> Result<Vec<IncomingStock>, StockError> {
        let rows = sqlx::query_as::<_, IncomingStock>(
            r#"
            SELECT i.product_id, r.store_id, SUM(i.quantity) AS quantity
            FROM restock_order_items i
            JOIN restock_orders r ON r.id = i.restock_order_id
            WHERE r.status IN ('initiated', 'in_transit')
              AND ($1::int IS NULL OR r.store_id = $1)
            GROUP BY i.product_id, r.store_id
            ORDER BY r.store_id, i.product_id
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Day-start and day-end counts recorded for `date`
    pub async fn report(
        &self,
        date: NaiveDate,
        store_id: Option<i32>,
    ) -> Result<Vec<StockReportRow>, StockError> {
        let rows = sqlx::query_as::<_, StockReportRow>(
            r#"
            SELECT sn.product_id, p.name AS product_name, sn.store_id, st.name AS store_name,
                   MAX(sn.quantity) FILTER (WHERE sn.kind = 'day_start') AS day_start_quantity,
                   MAX(sn.quantity) FILTER (WHERE sn.kind = 'day_end') AS day_end_quantity
            FROM stock_snapshots sn
            JOIN products p ON p.id = sn.product_id
            JOIN stores st ON st.id = sn.store_id
            WHERE sn.snapshot_date = $1
              AND ($2::int IS NULL OR sn.store_id = $2)
            GROUP BY sn.product_id, p.name, sn.store_id, st.name
            ORDER BY st.name, p.name
            "#,
        )
        .bind(date)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ----- stock writes -----

    /// Lock the stock row for (product, store) until the transaction ends
    pub async fn lock_stock(
        conn: &mut PgConnection,
        product_id: i32,
        store_id: i32,
    ) -> Result<Option<Stock>, StockError> {
        let stock = sqlx::query_as::<_, Stock>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock WHERE product_id = $1 AND store_id = $2 FOR UPDATE"
        ))
        .bind(product_id)
        .bind(store_id)
        .fetch_optional(conn)
        .await?;

        Ok(stock)
    }

    /// Set an existing row's quantity
    pub async fn update_quantity(
        conn: &mut PgConnection,
        stock_id: i32,
        quantity: Decimal,
    ) -> Result<Stock, StockError> {
        let stock = sqlx::query_as::<_, Stock>(&format!(
            r#"
            UPDATE stock SET quantity = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(stock_id)
        .bind(quantity)
        .fetch_one(conn)
        .await?;

        Ok(stock)
    }

    /// Insert or overwrite the row for (product, store)
    ///
    /// A `None` threshold leaves an existing threshold untouched.
    pub async fn upsert_quantity(
        conn: &mut PgConnection,
        product_id: i32,
        store_id: i32,
        quantity: Decimal,
        low_stock_threshold: Option<Decimal>,
    ) -> Result<Stock, StockError> {
        let stock = sqlx::query_as::<_, Stock>(&format!(
            r#"
            INSERT INTO stock (product_id, store_id, quantity, low_stock_threshold)
            VALUES ($1, $2, $3, COALESCE($4, 0))
            ON CONFLICT (product_id, store_id) DO UPDATE
            SET quantity            = EXCLUDED.quantity,
                low_stock_threshold = COALESCE($4, stock.low_stock_threshold),
                updated_at          = NOW()
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(store_id)
        .bind(quantity)
        .bind(low_stock_threshold)
        .fetch_one(conn)
        .await?;

        Ok(stock)
    }

    pub async fn upsert_snapshot(
        conn: &mut PgConnection,
        date: NaiveDate,
        product_id: i32,
        store_id: i32,
        kind: SnapshotKind,
        quantity: Decimal,
        recorded_by: i32,
    ) -> Result<(), StockError> {
        sqlx::query(
            r#"
            INSERT INTO stock_snapshots (snapshot_date, product_id, store_id, kind, quantity, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (snapshot_date, product_id, store_id, kind) DO UPDATE
            SET quantity = EXCLUDED.quantity,
                recorded_by = EXCLUDED.recorded_by,
                recorded_at = NOW()
            "#,
        )
        .bind(date)
        .bind(product_id)
        .bind(store_id)
        .bind(kind)
        .bind(quantity)
        .bind(recorded_by)
        .execute(conn)
        .await?;

        Ok(())
    }

    // ----- restock orders -----

    pub async fn list_restock(
        &self,
        query: &RestockQuery,
    ) -> Result<Vec<RestockOrderDetail>, StockError> {
        let orders = sqlx::query_as::<_, RestockOrder>(&format!(
            r#"
            SELECT {RESTOCK_COLUMNS} FROM restock_orders
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::int IS NULL OR store_id = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(query.status)
        .bind(query.store_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, RestockOrderItem>(
            r#"
            SELECT id, restock_order_id, product_id, quantity
            FROM restock_order_items
            WHERE restock_order_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items
                    .iter()
                    .filter(|i| i.restock_order_id == order.id)
                    .cloned()
                    .collect();
                RestockOrderDetail { order, items }
            })
            .collect())
    }

    pub async fn insert_restock(
        conn: &mut PgConnection,
        store_id: i32,
        notes: Option<&str>,
        created_by: i32,
    ) -> Result<RestockOrder, StockError> {
        let order = sqlx::query_as::<_, RestockOrder>(&format!(
            r#"
            INSERT INTO restock_orders (store_id, status, notes, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {RESTOCK_COLUMNS}
            "#
        ))
        .bind(store_id)
        .bind(RestockStatus::Initiated)
        .bind(notes)
        .bind(created_by)
        .fetch_one(conn)
        .await?;

        Ok(order)
    }

    pub async fn insert_restock_item(
        conn: &mut PgConnection,
        restock_order_id: i32,
        item: &RestockItemRequest,
    ) -> Result<RestockOrderItem, StockError> {
        let row = sqlx::query_as::<_, RestockOrderItem>(
            r#"
            INSERT INTO restock_order_items (restock_order_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, restock_order_id, product_id, quantity
            "#,
        )
        .bind(restock_order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn lock_restock(
        conn: &mut PgConnection,
        id: i32,
    ) -> Result<Option<RestockOrder>, StockError> {
        let order = sqlx::query_as::<_, RestockOrder>(&format!(
            "SELECT {RESTOCK_COLUMNS} FROM restock_orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(order)
    }

    pub async fn restock_items(
        conn: &mut PgConnection,
        restock_order_id: i32,
    ) -> Result<Vec<RestockOrderItem>, StockError> {
        let items = sqlx::query_as::<_, RestockOrderItem>(
            r#"
            SELECT id, restock_order_id, product_id, quantity
            FROM restock_order_items
            WHERE restock_order_id = $1
            ORDER BY id
            "#,
        )
        .bind(restock_order_id)
        .fetch_all(conn)
        .await?;

        Ok(items)
    }

    pub async fn set_tracking(
        conn: &mut PgConnection,
        id: i32,
        tracking_number: &str,
        at: DateTime<Utc>,
    ) -> Result<RestockOrder, StockError> {
        let order = sqlx::query_as::<_, RestockOrder>(&format!(
            r#"
            UPDATE restock_orders
            SET tracking_number = $2,
                status          = $3,
                shipped_at      = COALESCE(shipped_at, $4),
                updated_at      = $4
            WHERE id = $1
            RETURNING {RESTOCK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tracking_number)
        .bind(RestockStatus::InTransit)
        .bind(at)
        .fetch_one(conn)
        .await?;

        Ok(order)
    }

    /// Move to `status`, stamping `received_at` when it is `Received`
    pub async fn set_restock_status(
        conn: &mut PgConnection,
        id: i32,
        status: RestockStatus,
        at: DateTime<Utc>,
    ) -> Result<RestockOrder, StockError> {
        let order = sqlx::query_as::<_, RestockOrder>(&format!(
            r#"
            UPDATE restock_orders
            SET status      = $2,
                received_at = CASE WHEN $2 = 'received' THEN $3 ELSE received_at END,
                updated_at  = $3
            WHERE id = $1
            RETURNING {RESTOCK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(at)
        .fetch_one(conn)
        .await?;

        Ok(order)
    }
}
