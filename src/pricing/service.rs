use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::catalog::{
    discount_resolver::{DiscountResolver, ResolvedDiscount},
    error::CatalogError,
    models::Sector,
    repository::CatalogRepository,
};
use crate::pricing::{
    engine::{LinePrice, OrderTotals, PricingEngine},
    models::{CatalogEntry, LineRequest, QuoteRequest, QuoteResponse, SectorCatalog},
};

/// Resolves costs and discounts from the store and feeds the pricing engine
#[derive(Clone)]
pub struct PricingService {
    pool: PgPool,
}

impl PricingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sector and product-sector rates in force at `at`
    pub async fn resolve_discount(
        conn: &mut PgConnection,
        product_id: i32,
        sector: Option<&Sector>,
        at: DateTime<Utc>,
    ) -> Result<ResolvedDiscount, CatalogError> {
        let Some(sector) = sector else {
            return Ok(ResolvedDiscount::default());
        };

        let product_rate = CatalogRepository::effective_discount(conn, product_id, sector.id, at)
            .await?
            .map(|d| d.discount_percent);

        Ok(DiscountResolver::resolve(Some(sector.discount_rate), product_rate))
    }

    /// Load the sector for an optional id, failing when it does not exist
    pub async fn load_sector(
        conn: &mut PgConnection,
        sector_id: Option<i32>,
    ) -> Result<Option<Sector>, CatalogError> {
        match sector_id {
            None => Ok(None),
            Some(id) => CatalogRepository::sector_in(conn, id)
                .await?
                .map(Some)
                .ok_or(CatalogError::SectorNotFound(id)),
        }
    }

    /// Price every line against the cost and discount state visible on `conn`
    pub async fn price_lines(
        conn: &mut PgConnection,
        sector: Option<&Sector>,
        items: &[LineRequest],
        at: DateTime<Utc>,
    ) -> Result<(Vec<LinePrice>, OrderTotals), CatalogError> {
        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            let product = CatalogRepository::product_in(conn, item.product_id)
                .await?
                .ok_or(CatalogError::ProductNotFound(item.product_id))?;
            if !product.is_active {
                return Err(CatalogError::InvalidInput(format!(
                    "Product {} is not active",
                    product.id
                )));
            }

            let cost = CatalogRepository::effective_cost(conn, product.id, at)
                .await?
                .ok_or(CatalogError::CostNotFound(product.id))?;
            let base_price = PricingEngine::base_price(&cost);
            let discount = Self::resolve_discount(conn, product.id, sector, at).await?;

            lines.push(PricingEngine::price_line(
                product.id,
                base_price,
                item.quantity,
                &discount,
            )?);
        }

        let totals = PricingEngine::totals(&lines)?;
        Ok((lines, totals))
    }

    /// Price a basket without persisting anything
    pub async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let now = Utc::now();
        let sector = Self::load_sector(&mut conn, request.sector_id).await?;
        let (lines, totals) = Self::price_lines(&mut conn, sector.as_ref(), &request.items, now).await?;

        debug!("Quoted {} lines, total {}", lines.len(), totals.total);
        Ok(QuoteResponse {
            sector_id: request.sector_id,
            lines,
            totals,
        })
    }

    /// Every active product with a current cost, priced for one sector
    pub async fn sector_catalog(&self, sector_id: i32) -> Result<SectorCatalog, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let now = Utc::now();
        let sector = CatalogRepository::sector_in(&mut conn, sector_id)
            .await?
            .ok_or(CatalogError::SectorNotFound(sector_id))?;

        let products = CatalogRepository::active_products_in(&mut conn).await?;

        let mut items = Vec::with_capacity(products.len());
        for product in products {
            // Products without a cost cannot be priced and are left out
            let Some(cost) = CatalogRepository::effective_cost(&mut conn, product.id, now).await?
            else {
                continue;
            };
            let base_price = PricingEngine::base_price(&cost);
            let discount = Self::resolve_discount(&mut conn, product.id, Some(&sector), now).await?;

            items.push(CatalogEntry {
                product_id: product.id,
                name: product.name,
                sku: product.sku,
                barcode: product.barcode,
                category: product.category,
                base_price,
                sector_rate: discount.sector_rate,
                product_sector_rate: discount.product_sector_rate,
                discount_percent: discount.combined_rate,
                unit_price: PricingEngine::unit_price(base_price, &discount),
            });
        }

        debug!("Built catalog for sector {} with {} items", sector.id, items.len());
        Ok(SectorCatalog {
            sector_id: sector.id,
            sector_name: sector.name,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    async fn seed_product(pool: &PgPool, name: &str, active: bool, base: Option<Decimal>) -> i32 {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO products (name, category, is_active) VALUES ($1, 'pantry', $2) RETURNING id",
        )
        .bind(name)
        .bind(active)
        .fetch_one(pool)
        .await
        .unwrap();
        if let Some(base) = base {
            sqlx::query(
                "INSERT INTO product_costs (product_id, exchange_rate, wholesale_cost_gbp, effective_from) \
                 VALUES ($1, 1, $2, NOW() - INTERVAL '1 day')",
            )
            .bind(id)
            .bind(base)
            .execute(pool)
            .await
            .unwrap();
        }
        id
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_sector_catalog_lists_priced_active_products() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let pool = crate::db::create_pool(&url, 2).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        let service = PricingService::new(pool.clone());

        let sector_id: i32 = sqlx::query_scalar(
            "INSERT INTO sectors (name, discount_rate) VALUES ($1, 20) RETURNING id",
        )
        .bind(format!("Trade {}", Uuid::new_v4()))
        .fetch_one(&pool)
        .await
        .unwrap();

        let tag = Uuid::new_v4();
        let priced = seed_product(&pool, &format!("Lentils {}", tag), true, Some(dec!(8))).await;
        let unpriced = seed_product(&pool, &format!("Chickpeas {}", tag), true, None).await;
        let retired = seed_product(&pool, &format!("Barley {}", tag), false, Some(dec!(3))).await;

        let catalog = service.sector_catalog(sector_id).await.unwrap();
        let entry = catalog
            .items
            .iter()
            .find(|e| e.product_id == priced)
            .expect("priced product listed");
        assert_eq!(entry.base_price, dec!(8));
        assert_eq!(entry.discount_percent, dec!(20));
        assert_eq!(entry.unit_price, dec!(6.4));
        assert!(catalog.items.iter().all(|e| e.product_id != unpriced));
        assert!(catalog.items.iter().all(|e| e.product_id != retired));

        assert!(matches!(
            service.sector_catalog(i32::MAX).await,
            Err(CatalogError::SectorNotFound(_))
        ));
    }
}
