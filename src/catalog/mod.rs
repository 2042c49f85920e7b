// Catalog module
// Products, sectors, versioned costs and discounts, and price history

pub mod cost_calculator;
pub mod discount_resolver;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use cost_calculator::{CostBreakdown, CostCalculator};
pub use discount_resolver::{DiscountResolver, ResolvedDiscount};
pub use error::CatalogError;
pub use models::{Product, ProductCost, ProductSectorDiscount, Sector};
pub use repository::CatalogRepository;
pub use service::CatalogService;
