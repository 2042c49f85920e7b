use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::catalog::{
    discount_resolver::DiscountResolver,
    error::CatalogError,
    models::{
        Category, CostValues, CreateProductRequest, CreateSectorRequest, PriceHistoryEntry,
        Product, ProductCost, ProductSectorDiscount, Sector, UpdateProductRequest,
        UpdateSectorRequest,
    },
};

const PRODUCT_COLUMNS: &str =
    "id, name, barcode, sku, category, unit_type, is_active, created_at, updated_at";

const SECTOR_COLUMNS: &str =
    "id, name, description, discount_rate, is_active, created_at, updated_at";

const COST_COLUMNS: &str = "id, product_id, exchange_rate, purchasing_cost_foreign, \
    purchasing_cost_gbp, unit_weight_g, purchasing_cost_buffer_percent, cost_buffer_gbp, \
    adjusted_purchasing_cost_gbp, weight_g, weight_buffer_percent, freight_rate_per_kg, \
    freight_buffer_foreign, freight_foreign, freight_gbp, import_duty_percent, import_duty_gbp, \
    packaging_gbp, wholesale_cost_gbp, direct_retail_price_gbp, effective_from, effective_to, \
    created_at";

const DISCOUNT_COLUMNS: &str =
    "id, product_id, sector_id, discount_percent, effective_from, effective_to, created_at";

/// Rows returned by the price history query
pub const PRICE_HISTORY_LIMIT: i64 = 100;

/// Repository for products, sectors, and their versioned pricing rows
///
/// Methods taking `&self` run on the pool. Associated functions taking a
/// `PgConnection` run inside a caller's transaction.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ----- products -----

    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, CatalogError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE is_active AND ($1::text IS NULL OR category = $1)
            ORDER BY name
            "#
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn find_product(&self, id: i32) -> Result<Option<Product>, CatalogError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn create_product(&self, req: &CreateProductRequest) -> Result<Product, CatalogError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, barcode, sku, category, unit_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&req.name)
        .bind(&req.barcode)
        .bind(&req.sku)
        .bind(&req.category)
        .bind(req.unit_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: i32,
        req: &UpdateProductRequest,
    ) -> Result<Option<Product>, CatalogError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name       = COALESCE($2, name),
                barcode    = COALESCE($3, barcode),
                sku        = COALESCE($4, sku),
                category   = COALESCE($5, category),
                unit_type  = COALESCE($6, unit_type),
                is_active  = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.name)
        .bind(&req.barcode)
        .bind(&req.sku)
        .bind(&req.category)
        .bind(req.unit_type)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Returns false when the product does not exist
    pub async fn deactivate_product(&self, id: i32) -> Result<bool, CatalogError> {
        let result =
            sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active products in catalog order, on the caller's connection
    pub async fn active_products_in(conn: &mut PgConnection) -> Result<Vec<Product>, CatalogError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active ORDER BY category NULLS LAST, name"
        ))
        .fetch_all(conn)
        .await?;

        Ok(products)
    }

    // ----- categories -----

    /// Registered categories plus any still named on an active product
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.name, COUNT(p.id) AS product_count
            FROM (
                SELECT name FROM categories
                UNION
                SELECT category FROM products
                WHERE is_active AND category IS NOT NULL AND category <> ''
            ) c
            LEFT JOIN products p ON p.category = c.name AND p.is_active
            GROUP BY c.name
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Whether `name` is registered or used by any product
    pub async fn category_known(conn: &mut PgConnection, name: &str) -> Result<bool, CatalogError> {
        let known = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)
                OR EXISTS(SELECT 1 FROM products WHERE category = $1)
            "#,
        )
        .bind(name)
        .fetch_one(conn)
        .await?;
        Ok(known)
    }

    pub async fn insert_category(conn: &mut PgConnection, name: &str) -> Result<(), CatalogError> {
        sqlx::query("INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn delete_category_row(conn: &mut PgConnection, name: &str) -> Result<(), CatalogError> {
        sqlx::query("DELETE FROM categories WHERE name = $1")
            .bind(name)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Move every product in `from` to `to`, or clear it; returns rows touched
    pub async fn recategorize_products(
        conn: &mut PgConnection,
        from: &str,
        to: Option<&str>,
    ) -> Result<u64, CatalogError> {
        let result = sqlx::query(
            "UPDATE products SET category = $2, updated_at = NOW() WHERE category = $1",
        )
        .bind(from)
        .bind(to)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    // ----- sectors -----

    pub async fn list_sectors(&self) -> Result<Vec<Sector>, CatalogError> {
        let sectors = sqlx::query_as::<_, Sector>(&format!(
            "SELECT {SECTOR_COLUMNS} FROM sectors WHERE is_active ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(sectors)
    }

    pub async fn find_sector(&self, id: i32) -> Result<Option<Sector>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Self::sector_in(&mut conn, id).await
    }

    pub async fn create_sector(&self, req: &CreateSectorRequest) -> Result<Sector, CatalogError> {
        let sector = sqlx::query_as::<_, Sector>(&format!(
            r#"
            INSERT INTO sectors (name, description, discount_rate)
            VALUES ($1, $2, $3)
            RETURNING {SECTOR_COLUMNS}
            "#
        ))
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.discount_rate)
        .fetch_one(&self.pool)
        .await?;

        Ok(sector)
    }

    pub async fn update_sector(
        &self,
        id: i32,
        req: &UpdateSectorRequest,
    ) -> Result<Option<Sector>, CatalogError> {
        let sector = sqlx::query_as::<_, Sector>(&format!(
            r#"
            UPDATE sectors
            SET name          = COALESCE($2, name),
                description   = COALESCE($3, description),
                discount_rate = COALESCE($4, discount_rate),
                is_active     = COALESCE($5, is_active),
                updated_at    = NOW()
            WHERE id = $1
            RETURNING {SECTOR_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.discount_rate)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sector)
    }

    pub async fn deactivate_sector(&self, id: i32) -> Result<bool, CatalogError> {
        let result =
            sqlx::query("UPDATE sectors SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    // ----- reads usable inside a transaction -----

    pub async fn product_in(conn: &mut PgConnection, id: i32) -> Result<Option<Product>, CatalogError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }

    pub async fn sector_in(conn: &mut PgConnection, id: i32) -> Result<Option<Sector>, CatalogError> {
        let sector = sqlx::query_as::<_, Sector>(&format!(
            "SELECT {SECTOR_COLUMNS} FROM sectors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(sector)
    }

    /// Cost version in force at `at`
    pub async fn effective_cost(
        conn: &mut PgConnection,
        product_id: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<ProductCost>, CatalogError> {
        let candidates = sqlx::query_as::<_, ProductCost>(&format!(
            r#"
            SELECT {COST_COLUMNS} FROM product_costs
            WHERE product_id = $1 AND effective_from <= $2
              AND (effective_to IS NULL OR effective_to > $2)
            "#
        ))
        .bind(product_id)
        .bind(at)
        .fetch_all(conn)
        .await?;

        Ok(DiscountResolver::select_effective(&candidates, at).cloned())
    }

    /// Product-sector discount percent in force at `at`
    pub async fn effective_discount(
        conn: &mut PgConnection,
        product_id: i32,
        sector_id: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<ProductSectorDiscount>, CatalogError> {
        let candidates = sqlx::query_as::<_, ProductSectorDiscount>(&format!(
            r#"
            SELECT {DISCOUNT_COLUMNS} FROM product_sector_discounts
            WHERE product_id = $1 AND sector_id = $2 AND effective_from <= $3
              AND (effective_to IS NULL OR effective_to > $3)
            "#
        ))
        .bind(product_id)
        .bind(sector_id)
        .bind(at)
        .fetch_all(conn)
        .await?;

        Ok(DiscountResolver::select_effective(&candidates, at).cloned())
    }

    /// Every discount row in force at `at` for a product, one per sector
    pub async fn effective_discounts_for_product(
        &self,
        product_id: i32,
        at: DateTime<Utc>,
    ) -> Result<Vec<ProductSectorDiscount>, CatalogError> {
        let rows = sqlx::query_as::<_, ProductSectorDiscount>(&format!(
            r#"
            SELECT DISTINCT ON (sector_id) {DISCOUNT_COLUMNS} FROM product_sector_discounts
            WHERE product_id = $1 AND effective_from <= $2
              AND (effective_to IS NULL OR effective_to > $2)
            ORDER BY sector_id, effective_from DESC
            "#
        ))
        .bind(product_id)
        .bind(at)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ----- versioned writes -----

    /// Lock the open cost row of a product, if any
    pub async fn lock_active_cost(
        conn: &mut PgConnection,
        product_id: i32,
    ) -> Result<Option<ProductCost>, CatalogError> {
        let cost = sqlx::query_as::<_, ProductCost>(&format!(
            r#"
            SELECT {COST_COLUMNS} FROM product_costs
            WHERE product_id = $1 AND effective_to IS NULL
            FOR UPDATE
            "#
        ))
        .bind(product_id)
        .fetch_optional(conn)
        .await?;

        Ok(cost)
    }

    pub async fn close_cost(
        conn: &mut PgConnection,
        cost_id: i32,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        sqlx::query("UPDATE product_costs SET effective_to = $2 WHERE id = $1 AND effective_to IS NULL")
            .bind(cost_id)
            .bind(at)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn insert_cost(
        conn: &mut PgConnection,
        product_id: i32,
        values: &CostValues,
        at: DateTime<Utc>,
    ) -> Result<ProductCost, CatalogError> {
        let cost = sqlx::query_as::<_, ProductCost>(&format!(
            r#"
            INSERT INTO product_costs (
                product_id, exchange_rate, purchasing_cost_foreign, purchasing_cost_gbp,
                unit_weight_g, purchasing_cost_buffer_percent, cost_buffer_gbp,
                adjusted_purchasing_cost_gbp, weight_g, weight_buffer_percent,
                freight_rate_per_kg, freight_buffer_foreign, freight_foreign, freight_gbp,
                import_duty_percent, import_duty_gbp, packaging_gbp, wholesale_cost_gbp,
                direct_retail_price_gbp, effective_from
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING {COST_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(values.exchange_rate)
        .bind(values.purchasing_cost_foreign)
        .bind(values.purchasing_cost_gbp)
        .bind(values.unit_weight_g)
        .bind(values.purchasing_cost_buffer_percent)
        .bind(values.cost_buffer_gbp)
        .bind(values.adjusted_purchasing_cost_gbp)
        .bind(values.weight_g)
        .bind(values.weight_buffer_percent)
        .bind(values.freight_rate_per_kg)
        .bind(values.freight_buffer_foreign)
        .bind(values.freight_foreign)
        .bind(values.freight_gbp)
        .bind(values.import_duty_percent)
        .bind(values.import_duty_gbp)
        .bind(values.packaging_gbp)
        .bind(values.wholesale_cost_gbp)
        .bind(values.direct_retail_price_gbp)
        .bind(at)
        .fetch_one(conn)
        .await?;

        Ok(cost)
    }

    pub async fn lock_active_discount(
        conn: &mut PgConnection,
        product_id: i32,
        sector_id: i32,
    ) -> Result<Option<ProductSectorDiscount>, CatalogError> {
        let discount = sqlx::query_as::<_, ProductSectorDiscount>(&format!(
            r#"
            SELECT {DISCOUNT_COLUMNS} FROM product_sector_discounts
            WHERE product_id = $1 AND sector_id = $2 AND effective_to IS NULL
            FOR UPDATE
            "#
        ))
        .bind(product_id)
        .bind(sector_id)
        .fetch_optional(conn)
        .await?;

        Ok(discount)
    }

    pub async fn close_discount(
        conn: &mut PgConnection,
        discount_id: i32,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        sqlx::query(
            "UPDATE product_sector_discounts SET effective_to = $2 WHERE id = $1 AND effective_to IS NULL",
        )
        .bind(discount_id)
        .bind(at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn insert_discount(
        conn: &mut PgConnection,
        product_id: i32,
        sector_id: i32,
        discount_percent: Decimal,
        at: DateTime<Utc>,
    ) -> Result<ProductSectorDiscount, CatalogError> {
        let discount = sqlx::query_as::<_, ProductSectorDiscount>(&format!(
            r#"
            INSERT INTO product_sector_discounts (product_id, sector_id, discount_percent, effective_from)
            VALUES ($1, $2, $3, $4)
            RETURNING {DISCOUNT_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(sector_id)
        .bind(discount_percent)
        .bind(at)
        .fetch_one(conn)
        .await?;

        Ok(discount)
    }

    // ----- price history -----

    pub async fn append_price_history(
        conn: &mut PgConnection,
        product_id: i32,
        sector_id: Option<i32>,
        base_price: Decimal,
        discount_percent: Decimal,
        final_price: Decimal,
    ) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            INSERT INTO price_history (product_id, sector_id, base_price_gbp, discount_percent, final_price_gbp)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(product_id)
        .bind(sector_id)
        .bind(base_price)
        .bind(discount_percent)
        .bind(final_price)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn price_history(
        &self,
        product_id: i32,
        sector_id: Option<i32>,
    ) -> Result<Vec<PriceHistoryEntry>, CatalogError> {
        let rows = sqlx::query_as::<_, PriceHistoryEntry>(
            r#"
            SELECT id, product_id, sector_id, base_price_gbp, discount_percent, final_price_gbp, recorded_at
            FROM price_history
            WHERE product_id = $1 AND ($2::int IS NULL OR sector_id = $2)
            ORDER BY recorded_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(product_id)
        .bind(sector_id)
        .bind(PRICE_HISTORY_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
