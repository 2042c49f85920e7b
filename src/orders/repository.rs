use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::orders::{
    error::OrderError,
    models::{
        DailyProductSales, DailyRevenue, Order, OrderDetail, OrderItem, OrderListQuery,
        OrderStatus,
    },
};
use crate::pricing::engine::LinePrice;

const ORDER_COLUMNS: &str = "id, order_number, store_id, user_id, device_code, sector_id, \
    subtotal, discount_amount, total_amount, status, invoice_check_code, receipt_check_code, \
    created_at, updated_at, paid_at, completed_at, picked_up_at";

const ITEM_SELECT: &str = r#"
    SELECT i.id, i.order_id, i.product_id, p.name AS product_name, i.quantity, i.unit_price,
           i.discount_percent, i.discount_amount, i.line_total, i.reserved_quantity
    FROM order_items i
    JOIN products p ON p.id = i.product_id
"#;

/// Statuses counted in sales reports, matching `OrderStatus::counts_as_sale`
const SALE_STATUSES: &str = "('paid', 'completed', 'picked_up')";

/// Values for a new order row
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub store_id: i32,
    pub user_id: i32,
    pub device_code: Option<&'a str>,
    pub sector_id: Option<i32>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub invoice_check_code: &'a str,
    pub receipt_check_code: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Repository for orders, their items, and sales aggregates
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn store_exists(conn: &mut PgConnection, id: i32) -> Result<bool, OrderError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }

    /// Insert the order row
    ///
    /// Returns the raw sqlx error so callers can tell an order-number
    /// collision apart from other failures.
    pub async fn insert_order(
        conn: &mut PgConnection,
        order: &NewOrder<'_>,
    ) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (id, order_number, store_id, user_id, device_code, sector_id,
                                subtotal, discount_amount, total_amount, status,
                                invoice_check_code, receipt_check_code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(order.order_number)
        .bind(order.store_id)
        .bind(order.user_id)
        .bind(order.device_code)
        .bind(order.sector_id)
        .bind(order.subtotal)
        .bind(order.discount_amount)
        .bind(order.total_amount)
        .bind(OrderStatus::Pending)
        .bind(order.invoice_check_code)
        .bind(order.receipt_check_code)
        .bind(order.created_at)
        .fetch_one(conn)
        .await
    }

    pub async fn insert_item(
        conn: &mut PgConnection,
        order_id: Uuid,
        line: &LinePrice,
        reserved_quantity: Decimal,
    ) -> Result<(), OrderError> {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price,
                                     discount_percent, discount_amount, line_total,
                                     reserved_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.discount_percent)
        .bind(line.discount_amount)
        .bind(line.line_total)
        .bind(reserved_quantity)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn items(conn: &mut PgConnection, order_id: Uuid) -> Result<Vec<OrderItem>, OrderError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "{ITEM_SELECT} WHERE i.order_id = $1 ORDER BY i.id"
        ))
        .bind(order_id)
        .fetch_all(conn)
        .await?;
        Ok(items)
    }

    pub async fn lock_order(conn: &mut PgConnection, id: Uuid) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(order)
    }

    /// Case-insensitive lookup; scanned codes are sometimes lower-cased
    pub async fn lock_by_number(
        conn: &mut PgConnection,
        order_number: &str,
    ) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE UPPER(order_number) = UPPER($1) FOR UPDATE"
        ))
        .bind(order_number)
        .fetch_optional(conn)
        .await?;
        Ok(order)
    }

    pub async fn mark_paid(
        conn: &mut PgConnection,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        Self::set_status(conn, id, OrderStatus::Paid, "paid_at = COALESCE(paid_at, $3),", at).await
    }

    pub async fn mark_completed(
        conn: &mut PgConnection,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        Self::set_status(conn, id, OrderStatus::Completed, "completed_at = $3,", at).await
    }

    pub async fn mark_cancelled(
        conn: &mut PgConnection,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        Self::set_status(conn, id, OrderStatus::Cancelled, "", at).await
    }

    /// Pickup stores `completed` plus the pickup time
    pub async fn mark_picked_up(
        conn: &mut PgConnection,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        Self::set_status(
            conn,
            id,
            OrderStatus::Completed,
            "picked_up_at = $3, completed_at = COALESCE(completed_at, $3),",
            at,
        )
        .await
    }

    /// `stamps` is extra `column = value,` assignments for the SET clause
    async fn set_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: OrderStatus,
        stamps: &str,
        at: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = $2, {stamps} updated_at = $3
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(at)
        .fetch_one(conn)
        .await?;
        Ok(order)
    }

    // ----- reads -----

    pub async fn find(&self, id: Uuid) -> Result<Option<OrderDetail>, OrderError> {
        let mut conn = self.pool.acquire().await?;
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match order {
            Some(order) => {
                let items = Self::items(&mut conn, order.id).await?;
                Ok(Some(OrderDetail { order, items }))
            }
            None => Ok(None),
        }
    }

    /// Newest first; `user_id` in the query is overridden by `only_user`
    pub async fn list(
        &self,
        query: &OrderListQuery,
        only_user: Option<i32>,
    ) -> Result<Vec<OrderDetail>, OrderError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::int IS NULL OR store_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::int IS NULL OR user_id = $3)
              AND ($4::date IS NULL OR created_at >= $4::date)
              AND ($5::date IS NULL OR created_at < $5::date + 1)
            ORDER BY created_at DESC
            LIMIT $6
            "#
        ))
        .bind(query.store_id)
        .bind(query.status)
        .bind(only_user.or(query.user_id))
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(query.effective_limit())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "{ITEM_SELECT} WHERE i.order_id = ANY($1) ORDER BY i.id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items
                    .iter()
                    .filter(|i| i.order_id == order.id)
                    .cloned()
                    .collect();
                OrderDetail { order, items }
            })
            .collect())
    }

    // ----- reports -----

    pub async fn daily_revenue(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        store_id: Option<i32>,
    ) -> Result<Vec<DailyRevenue>, OrderError> {
        let rows = sqlx::query_as::<_, DailyRevenue>(&format!(
            r#"
            SELECT DATE(created_at) AS date,
                   SUM(total_amount) AS revenue,
                   COUNT(*) AS order_count
            FROM orders
            WHERE created_at >= $1::date
              AND created_at < $2::date + 1
              AND status IN {SALE_STATUSES}
              AND ($3::int IS NULL OR store_id = $3)
            GROUP BY DATE(created_at)
            ORDER BY date
            "#
        ))
        .bind(start)
        .bind(end)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn daily_product_sales(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        store_id: Option<i32>,
    ) -> Result<Vec<DailyProductSales>, OrderError> {
        let rows = sqlx::query_as::<_, DailyProductSales>(&format!(
            r#"
            SELECT DATE(o.created_at) AS date,
                   i.product_id,
                   p.name AS product_name,
                   SUM(i.quantity) AS quantity,
                   SUM(i.line_total) AS revenue
            FROM orders o
            JOIN order_items i ON i.order_id = o.id
            JOIN products p ON p.id = i.product_id
            WHERE o.created_at >= $1::date
              AND o.created_at < $2::date + 1
              AND o.status IN {SALE_STATUSES}
              AND ($3::int IS NULL OR o.store_id = $3)
            GROUP BY DATE(o.created_at), i.product_id, p.name
            ORDER BY date, i.product_id
            "#
        ))
        .bind(start)
        .bind(end)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
