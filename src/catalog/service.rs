use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::catalog::{
    cost_calculator::CostCalculator,
    discount_resolver::ResolvedDiscount,
    error::CatalogError,
    models::{
        Category, CategoryDeleted, CategoryRenamed, CostValues, CreateCategoryRequest,
        CreateProductRequest, CreateSectorRequest, PriceHistoryEntry, Product, ProductCost,
        ProductDetail, ProductSectorDiscount, RenameCategoryRequest, Sector, SetCostRequest,
        UpdateCostRequest, UpdateProductRequest, UpdateSectorRequest,
    },
    repository::CatalogRepository,
};
use crate::pricing::engine::PricingEngine;

/// Trimmed category name, rejecting names that are only whitespace
fn category_name(raw: &str) -> Result<&str, CatalogError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CatalogError::InvalidInput(
            "Category name cannot be blank".to_string(),
        ));
    }
    Ok(name)
}

/// Catalog business logic: products, sectors, and versioned cost and discount writes
#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository) -> Self {
        Self { repo }
    }

    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, CatalogError> {
        self.repo.list_products(category).await
    }

    pub async fn get_product(&self, id: i32) -> Result<ProductDetail, CatalogError> {
        let product = self
            .repo
            .find_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;

        let mut conn = self.repo.pool().acquire().await?;
        let current_cost = CatalogRepository::effective_cost(&mut conn, id, Utc::now()).await?;

        Ok(ProductDetail {
            product,
            current_cost,
        })
    }

    pub async fn create_product(&self, req: CreateProductRequest) -> Result<Product, CatalogError> {
        let product = self.repo.create_product(&req).await?;
        info!("Created product {} ({})", product.id, product.name);
        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: i32,
        req: UpdateProductRequest,
    ) -> Result<Product, CatalogError> {
        let product = self
            .repo
            .update_product(id, &req)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;
        info!("Updated product {}", id);
        Ok(product)
    }

    pub async fn delete_product(&self, id: i32) -> Result<(), CatalogError> {
        if !self.repo.deactivate_product(id).await? {
            return Err(CatalogError::ProductNotFound(id));
        }
        info!("Deactivated product {}", id);
        Ok(())
    }

    // ----- categories -----

    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.repo.list_categories().await
    }

    pub async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, CatalogError> {
        let name = category_name(&req.name)?;

        let mut tx = self.repo.pool().begin().await?;
        if CatalogRepository::category_known(&mut tx, name).await? {
            return Err(CatalogError::CategoryExists(name.to_string()));
        }
        CatalogRepository::insert_category(&mut tx, name).await?;
        tx.commit().await?;

        info!("Created category {}", name);
        Ok(Category {
            name: name.to_string(),
            product_count: 0,
        })
    }

    /// Rename a category on every product using it; renaming onto an
    /// existing category merges the two
    pub async fn rename_category(
        &self,
        old_name: &str,
        req: RenameCategoryRequest,
    ) -> Result<CategoryRenamed, CatalogError> {
        let new_name = category_name(&req.new_name)?;

        let mut tx = self.repo.pool().begin().await?;
        if !CatalogRepository::category_known(&mut tx, old_name).await? {
            return Err(CatalogError::CategoryNotFound(old_name.to_string()));
        }

        let products_updated = if new_name == old_name {
            0
        } else {
            let updated =
                CatalogRepository::recategorize_products(&mut tx, old_name, Some(new_name)).await?;
            CatalogRepository::insert_category(&mut tx, new_name).await?;
            CatalogRepository::delete_category_row(&mut tx, old_name).await?;
            updated
        };
        tx.commit().await?;

        info!(
            "Renamed category {} to {} ({} products)",
            old_name, new_name, products_updated
        );
        Ok(CategoryRenamed {
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            products_updated,
        })
    }

    /// Remove a category, leaving its products uncategorised
    pub async fn delete_category(&self, name: &str) -> Result<CategoryDeleted, CatalogError> {
        let mut tx = self.repo.pool().begin().await?;
        if !CatalogRepository::category_known(&mut tx, name).await? {
            return Err(CatalogError::CategoryNotFound(name.to_string()));
        }
        let products_updated = CatalogRepository::recategorize_products(&mut tx, name, None).await?;
        CatalogRepository::delete_category_row(&mut tx, name).await?;
        tx.commit().await?;

        info!("Deleted category {} ({} products cleared)", name, products_updated);
        Ok(CategoryDeleted {
            name: name.to_string(),
            products_updated,
        })
    }

    // ----- sectors -----

    pub async fn list_sectors(&self) -> Result<Vec<Sector>, CatalogError> {
        self.repo.list_sectors().await
    }

    pub async fn get_sector(&self, id: i32) -> Result<Sector, CatalogError> {
        self.repo
            .find_sector(id)
            .await?
            .ok_or(CatalogError::SectorNotFound(id))
    }

    pub async fn create_sector(&self, req: CreateSectorRequest) -> Result<Sector, CatalogError> {
        let sector = self.repo.create_sector(&req).await?;
        info!("Created sector {} ({})", sector.id, sector.name);
        Ok(sector)
    }

    pub async fn update_sector(&self, id: i32, req: UpdateSectorRequest) -> Result<Sector, CatalogError> {
        self.repo
            .update_sector(id, &req)
            .await?
            .ok_or(CatalogError::SectorNotFound(id))
    }

    pub async fn delete_sector(&self, id: i32) -> Result<(), CatalogError> {
        if !self.repo.deactivate_sector(id).await? {
            return Err(CatalogError::SectorNotFound(id));
        }
        info!("Deactivated sector {}", id);
        Ok(())
    }

    /// Compute a landed cost and make it the product's current version
    ///
    /// The open row is locked, closed at `now`, and replaced in one
    /// transaction, followed by a price history row at the wholesale cost.
    pub async fn set_cost(&self, product_id: i32, req: SetCostRequest) -> Result<ProductCost, CatalogError> {
        let breakdown = CostCalculator::calculate(&req)?;
        let values = CostValues::from_calculation(&req, &breakdown);

        let mut tx = self.repo.pool().begin().await?;
        CatalogRepository::product_in(&mut tx, product_id)
            .await?
            .ok_or(CatalogError::ProductNotFound(product_id))?;

        let now = Utc::now();
        if let Some(previous) = CatalogRepository::lock_active_cost(&mut tx, product_id).await? {
            CatalogRepository::close_cost(&mut tx, previous.id, now).await?;
        }
        let cost = CatalogRepository::insert_cost(&mut tx, product_id, &values, now).await?;

        CatalogRepository::append_price_history(
            &mut tx,
            product_id,
            None,
            cost.wholesale_cost_gbp,
            Decimal::ZERO,
            cost.wholesale_cost_gbp,
        )
        .await?;

        tx.commit().await?;
        info!(
            "New cost version {} for product {}: wholesale {}",
            cost.id, product_id, cost.wholesale_cost_gbp
        );
        Ok(cost)
    }

    /// Replace the derived prices of the current cost
    ///
    /// Without a current cost a minimal one is created. Otherwise the
    /// previous inputs are copied into a new version carrying the overrides.
    pub async fn update_cost(
        &self,
        product_id: i32,
        req: UpdateCostRequest,
    ) -> Result<ProductCost, CatalogError> {
        let mut tx = self.repo.pool().begin().await?;
        CatalogRepository::product_in(&mut tx, product_id)
            .await?
            .ok_or(CatalogError::ProductNotFound(product_id))?;

        let now = Utc::now();
        let previous = CatalogRepository::lock_active_cost(&mut tx, product_id).await?;

        let values = match &previous {
            None => CostValues::minimal(
                req.wholesale_cost_gbp.unwrap_or_default(),
                req.direct_retail_price_gbp.unwrap_or_default(),
            ),
            Some(prev) => {
                let mut values = CostValues::from_previous(prev);
                if let Some(wholesale) = req.wholesale_cost_gbp {
                    values.wholesale_cost_gbp = wholesale;
                }
                if let Some(retail) = req.direct_retail_price_gbp {
                    values.direct_retail_price_gbp = retail;
                }
                if values == CostValues::from_previous(prev) {
                    debug!("Cost update for product {} changes nothing", product_id);
                    tx.commit().await?;
                    return Ok(prev.clone());
                }
                values
            }
        };

        if let Some(prev) = &previous {
            CatalogRepository::close_cost(&mut tx, prev.id, now).await?;
        }
        let cost = CatalogRepository::insert_cost(&mut tx, product_id, &values, now).await?;

        if let Some(wholesale) = req.wholesale_cost_gbp {
            CatalogRepository::append_price_history(
                &mut tx,
                product_id,
                None,
                wholesale,
                Decimal::ZERO,
                wholesale,
            )
            .await?;
        }

        tx.commit().await?;
        info!("Cost of product {} updated to version {}", product_id, cost.id);
        Ok(cost)
    }

    /// Version a product's discount within a sector
    pub async fn set_discount(
        &self,
        product_id: i32,
        sector_id: i32,
        discount_percent: Decimal,
    ) -> Result<ProductSectorDiscount, CatalogError> {
        let mut tx = self.repo.pool().begin().await?;
        CatalogRepository::product_in(&mut tx, product_id)
            .await?
            .ok_or(CatalogError::ProductNotFound(product_id))?;
        let sector = CatalogRepository::sector_in(&mut tx, sector_id)
            .await?
            .ok_or(CatalogError::SectorNotFound(sector_id))?;

        let now = Utc::now();
        if let Some(previous) =
            CatalogRepository::lock_active_discount(&mut tx, product_id, sector_id).await?
        {
            CatalogRepository::close_discount(&mut tx, previous.id, now).await?;
        }
        let discount =
            CatalogRepository::insert_discount(&mut tx, product_id, sector_id, discount_percent, now)
                .await?;

        if let Some(cost) = CatalogRepository::effective_cost(&mut tx, product_id, now).await? {
            let base_price = PricingEngine::base_price(&cost);
            let resolved = ResolvedDiscount::new(sector.discount_rate, discount_percent);
            CatalogRepository::append_price_history(
                &mut tx,
                product_id,
                Some(sector_id),
                base_price,
                resolved.combined_rate,
                PricingEngine::unit_price(base_price, &resolved),
            )
            .await?;
        }

        tx.commit().await?;
        info!(
            "Discount for product {} in sector {} set to {}%",
            product_id, sector_id, discount_percent
        );
        Ok(discount)
    }

    /// End the open discount for (product, sector)
    ///
    /// The closed row is returned. When the product has a current cost a
    /// price history row records the price with only the sector rate left.
    pub async fn remove_discount(
        &self,
        product_id: i32,
        sector_id: i32,
    ) -> Result<ProductSectorDiscount, CatalogError> {
        let mut tx = self.repo.pool().begin().await?;
        CatalogRepository::product_in(&mut tx, product_id)
            .await?
            .ok_or(CatalogError::ProductNotFound(product_id))?;
        let sector = CatalogRepository::sector_in(&mut tx, sector_id)
            .await?
            .ok_or(CatalogError::SectorNotFound(sector_id))?;

        let previous = CatalogRepository::lock_active_discount(&mut tx, product_id, sector_id)
            .await?
            .ok_or(CatalogError::DiscountNotFound {
                product_id,
                sector_id,
            })?;

        let now = Utc::now();
        CatalogRepository::close_discount(&mut tx, previous.id, now).await?;

        if let Some(cost) = CatalogRepository::effective_cost(&mut tx, product_id, now).await? {
            let base_price = PricingEngine::base_price(&cost);
            let resolved = ResolvedDiscount::new(sector.discount_rate, Decimal::ZERO);
            CatalogRepository::append_price_history(
                &mut tx,
                product_id,
                Some(sector_id),
                base_price,
                resolved.combined_rate,
                PricingEngine::unit_price(base_price, &resolved),
            )
            .await?;
        }

        tx.commit().await?;
        info!("Discount for product {} in sector {} removed", product_id, sector_id);
        Ok(ProductSectorDiscount {
            effective_to: Some(now),
            ..previous
        })
    }

    pub async fn list_discounts(&self, product_id: i32) -> Result<Vec<ProductSectorDiscount>, CatalogError> {
        self.repo
            .find_product(product_id)
            .await?
            .ok_or(CatalogError::ProductNotFound(product_id))?;
        self.repo
            .effective_discounts_for_product(product_id, Utc::now())
            .await
    }

    pub async fn price_history(
        &self,
        product_id: i32,
        sector_id: Option<i32>,
    ) -> Result<Vec<PriceHistoryEntry>, CatalogError> {
        self.repo
            .find_product(product_id)
            .await?
            .ok_or(CatalogError::ProductNotFound(product_id))?;
        self.repo.price_history(product_id, sector_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;

    async fn test_service() -> CatalogService {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let pool = crate::db::create_pool(&url, 4).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        CatalogService::new(CatalogRepository::new(pool))
    }

    async fn seed_sector(service: &CatalogService, rate: Decimal) -> Sector {
        service
            .create_sector(CreateSectorRequest {
                name: format!("Retail {}", uuid::Uuid::new_v4()),
                description: String::new(),
                discount_rate: rate,
            })
            .await
            .unwrap()
    }

    async fn open_discount_rows(service: &CatalogService, product_id: i32, sector_id: i32) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM product_sector_discounts \
             WHERE product_id = $1 AND sector_id = $2 AND effective_to IS NULL",
        )
        .bind(product_id)
        .bind(sector_id)
        .fetch_one(service.repo.pool())
        .await
        .unwrap()
    }

    #[test]
    fn test_category_name_is_trimmed() {
        assert_eq!(category_name("  Tea ").unwrap(), "Tea");
        assert!(matches!(category_name("   "), Err(CatalogError::InvalidInput(_))));
    }

    async fn seed_product(service: &CatalogService) -> Product {
        service
            .create_product(CreateProductRequest {
                name: format!("Jasmine {}", uuid::Uuid::new_v4()),
                barcode: None,
                sku: None,
                category: Some("tea".into()),
                unit_type: Default::default(),
            })
            .await
            .unwrap()
    }

    async fn open_cost_rows(service: &CatalogService, product_id: i32) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM product_costs WHERE product_id = $1 AND effective_to IS NULL",
        )
        .bind(product_id)
        .fetch_one(service.repo.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_set_cost_keeps_single_open_version() {
        let service = test_service().await;
        let product = seed_product(&service).await;

        let input = SetCostRequest {
            exchange_rate: dec!(10),
            purchasing_cost_foreign: dec!(100),
            packaging_gbp: dec!(0.5),
            ..Default::default()
        };
        let first = service.set_cost(product.id, input.clone()).await.unwrap();
        assert_eq!(first.wholesale_cost_gbp, dec!(10.5));
        assert_eq!(open_cost_rows(&service, product.id).await, 1);

        let second = service
            .set_cost(product.id, SetCostRequest { packaging_gbp: dec!(1), ..input })
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(open_cost_rows(&service, product.id).await, 1);

        let history = service.price_history(product.id, None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].final_price_gbp, dec!(11));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_simple_cost_update_creates_minimal_row() {
        let service = test_service().await;
        let product = seed_product(&service).await;

        let cost = service
            .update_cost(
                product.id,
                UpdateCostRequest {
                    wholesale_cost_gbp: None,
                    direct_retail_price_gbp: Some(dec!(12.99)),
                },
            )
            .await
            .unwrap();
        assert_eq!(cost.exchange_rate, dec!(1));
        assert_eq!(cost.direct_retail_price_gbp, dec!(12.99));

        let detail = service.get_product(product.id).await.unwrap();
        assert_eq!(detail.current_cost.map(|c| c.id), Some(cost.id));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_unknown_product_cost_is_not_found() {
        let service = test_service().await;
        let result = service
            .set_cost(
                i32::MAX,
                SetCostRequest {
                    exchange_rate: dec!(1),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(CatalogError::ProductNotFound(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_concurrent_set_cost_leaves_one_open_version() {
        let service = test_service().await;
        let product = seed_product(&service).await;
        let input = SetCostRequest {
            exchange_rate: dec!(1),
            purchasing_cost_foreign: dec!(4),
            ..Default::default()
        };
        service.set_cost(product.id, input.clone()).await.unwrap();

        let (a, b) = tokio::join!(
            service.set_cost(
                product.id,
                SetCostRequest {
                    packaging_gbp: dec!(1),
                    ..input.clone()
                }
            ),
            service.set_cost(
                product.id,
                SetCostRequest {
                    packaging_gbp: dec!(2),
                    ..input.clone()
                }
            ),
        );

        assert!(a.is_ok() || b.is_ok());
        for result in [a, b] {
            if let Err(err) = result {
                assert_eq!(ApiError::from(err).status_code(), StatusCode::CONFLICT);
            }
        }
        assert_eq!(open_cost_rows(&service, product.id).await, 1);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_set_discount_versions_and_records_price() {
        let service = test_service().await;
        let product = seed_product(&service).await;
        let sector = seed_sector(&service, dec!(10)).await;
        service
            .update_cost(
                product.id,
                UpdateCostRequest {
                    wholesale_cost_gbp: None,
                    direct_retail_price_gbp: Some(dec!(100)),
                },
            )
            .await
            .unwrap();

        let first = service.set_discount(product.id, sector.id, dec!(10)).await.unwrap();
        assert_eq!(open_discount_rows(&service, product.id, sector.id).await, 1);

        let second = service.set_discount(product.id, sector.id, dec!(5)).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(open_discount_rows(&service, product.id, sector.id).await, 1);

        let current = service.list_discounts(product.id).await.unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].discount_percent, dec!(5));

        // Newest first: displayed S+P, final price applies the rates in turn
        let history = service.price_history(product.id, Some(sector.id)).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].base_price_gbp, dec!(100));
        assert_eq!(history[0].discount_percent, dec!(15));
        assert_eq!(history[0].final_price_gbp, dec!(85.5));
        assert_eq!(history[1].discount_percent, dec!(20));
        assert_eq!(history[1].final_price_gbp, dec!(81));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_remove_discount_closes_open_row() {
        let service = test_service().await;
        let product = seed_product(&service).await;
        let sector = seed_sector(&service, dec!(0)).await;

        let missing = service.remove_discount(product.id, sector.id).await;
        assert!(matches!(missing, Err(CatalogError::DiscountNotFound { .. })));

        let discount = service.set_discount(product.id, sector.id, dec!(12)).await.unwrap();
        let removed = service.remove_discount(product.id, sector.id).await.unwrap();
        assert_eq!(removed.id, discount.id);
        assert!(removed.effective_to.is_some());
        assert_eq!(open_discount_rows(&service, product.id, sector.id).await, 0);
        assert!(service.list_discounts(product.id).await.unwrap().is_empty());

        let sector_again = service.get_sector(sector.id).await.unwrap();
        assert_eq!(sector_again.name, sector.name);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_category_rename_and_delete_follow_products() {
        let service = test_service().await;
        let tea = format!("tea-{}", uuid::Uuid::new_v4());
        let herbal = format!("herbal-{}", uuid::Uuid::new_v4());
        let product = service
            .create_product(CreateProductRequest {
                name: "Chamomile".into(),
                barcode: None,
                sku: None,
                category: Some(tea.clone()),
                unit_type: Default::default(),
            })
            .await
            .unwrap();

        let duplicate = service
            .create_category(CreateCategoryRequest { name: tea.clone() })
            .await;
        assert!(matches!(duplicate, Err(CatalogError::CategoryExists(_))));

        service
            .create_category(CreateCategoryRequest {
                name: format!(" {} ", herbal),
            })
            .await
            .unwrap();
        let listed = service.list_categories().await.unwrap();
        assert!(listed.iter().any(|c| c.name == herbal && c.product_count == 0));
        assert!(listed.iter().any(|c| c.name == tea && c.product_count == 1));

        let renamed = service
            .rename_category(&tea, RenameCategoryRequest { new_name: herbal.clone() })
            .await
            .unwrap();
        assert_eq!(renamed.products_updated, 1);
        let moved = service.get_product(product.id).await.unwrap();
        assert_eq!(moved.product.category.as_deref(), Some(herbal.as_str()));

        let deleted = service.delete_category(&herbal).await.unwrap();
        assert_eq!(deleted.products_updated, 1);
        let cleared = service.get_product(product.id).await.unwrap();
        assert_eq!(cleared.product.category, None);

        assert!(matches!(
            service.delete_category(&herbal).await,
            Err(CatalogError::CategoryNotFound(_))
        ));
        assert!(matches!(
            service
                .rename_category(&tea, RenameCategoryRequest { new_name: "x".into() })
                .await,
            Err(CatalogError::CategoryNotFound(_))
        ));
    }
}
