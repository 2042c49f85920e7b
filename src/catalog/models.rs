// Catalog data models and DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::catalog::cost_calculator::CostBreakdown;
use crate::validation::{
    validate_amount, validate_buffer_percent, validate_exchange_rate, validate_percent,
    validate_stock_quantity,
};

/// How a product is sold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Quantity,
    Weight,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Quantity => "quantity",
            UnitType::Weight => "weight",
        }
    }
}

impl Default for UnitType {
    fn default() -> Self {
        UnitType::Quantity
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit_type: UnitType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product together with its currently active cost
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub current_cost: Option<ProductCost>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub unit_type: UnitType,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit_type: Option<UnitType>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProductQuery {
    pub category: Option<String>,
}

/// Product grouping with the number of active products in it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub name: String,
    pub product_count: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenameCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "New name is required"))]
    pub new_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryRenamed {
    pub old_name: String,
    pub new_name: String,
    pub products_updated: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryDeleted {
    pub name: String,
    /// Products left without a category
    pub products_updated: u64,
}

/// Customer segment with a base discount rate
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sector {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub discount_rate: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSectorRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "validate_percent")]
    #[serde(default)]
    pub discount_rate: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSectorRequest {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_percent")]
    pub discount_rate: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// One version of a product's landed cost
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProductCost {
    pub id: i32,
    pub product_id: i32,
    pub exchange_rate: Decimal,
    pub purchasing_cost_foreign: Decimal,
    pub purchasing_cost_gbp: Decimal,
    pub unit_weight_g: Decimal,
    pub purchasing_cost_buffer_percent: Decimal,
    pub cost_buffer_gbp: Decimal,
    pub adjusted_purchasing_cost_gbp: Decimal,
    pub weight_g: Decimal,
    pub weight_buffer_percent: Decimal,
    pub freight_rate_per_kg: Decimal,
    pub freight_buffer_foreign: Decimal,
    pub freight_foreign: Decimal,
    pub freight_gbp: Decimal,
    pub import_duty_percent: Decimal,
    pub import_duty_gbp: Decimal,
    pub packaging_gbp: Decimal,
    pub wholesale_cost_gbp: Decimal,
    pub direct_retail_price_gbp: Decimal,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Purchase-side inputs for the landed cost calculation
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct SetCostRequest {
    /// Foreign currency units per pound
    #[validate(custom = "validate_exchange_rate")]
    pub exchange_rate: Decimal,
    #[validate(custom = "validate_amount")]
    #[serde(default)]
    pub purchasing_cost_foreign: Decimal,
    #[validate(custom = "validate_stock_quantity")]
    #[serde(default)]
    pub unit_weight_g: Decimal,
    #[validate(custom = "validate_buffer_percent")]
    #[serde(default)]
    pub purchasing_cost_buffer_percent: Decimal,
    #[validate(custom = "validate_stock_quantity")]
    #[serde(default)]
    pub weight_g: Decimal,
    #[validate(custom = "validate_buffer_percent")]
    #[serde(default)]
    pub weight_buffer_percent: Decimal,
    #[validate(custom = "validate_amount")]
    #[serde(default)]
    pub freight_rate_per_kg: Decimal,
    #[validate(custom = "validate_amount")]
    #[serde(default)]
    pub freight_buffer_foreign: Decimal,
    #[validate(custom = "validate_buffer_percent")]
    #[serde(default)]
    pub import_duty_percent: Decimal,
    #[validate(custom = "validate_amount")]
    #[serde(default)]
    pub packaging_gbp: Decimal,
    #[validate(custom = "validate_amount")]
    #[serde(default)]
    pub direct_retail_price_gbp: Decimal,
}

/// Column values of a cost version about to be inserted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostValues {
    pub exchange_rate: Decimal,
    pub purchasing_cost_foreign: Decimal,
    pub purchasing_cost_gbp: Decimal,
    pub unit_weight_g: Decimal,
    pub purchasing_cost_buffer_percent: Decimal,
    pub cost_buffer_gbp: Decimal,
    pub adjusted_purchasing_cost_gbp: Decimal,
    pub weight_g: Decimal,
    pub weight_buffer_percent: Decimal,
    pub freight_rate_per_kg: Decimal,
    pub freight_buffer_foreign: Decimal,
    pub freight_foreign: Decimal,
    pub freight_gbp: Decimal,
    pub import_duty_percent: Decimal,
    pub import_duty_gbp: Decimal,
    pub packaging_gbp: Decimal,
    pub wholesale_cost_gbp: Decimal,
    pub direct_retail_price_gbp: Decimal,
}

impl CostValues {
    pub fn from_calculation(input: &SetCostRequest, derived: &CostBreakdown) -> Self {
        Self {
            exchange_rate: input.exchange_rate,
            purchasing_cost_foreign: input.purchasing_cost_foreign,
            purchasing_cost_gbp: derived.purchasing_cost_gbp,
            unit_weight_g: input.unit_weight_g,
            purchasing_cost_buffer_percent: input.purchasing_cost_buffer_percent,
            cost_buffer_gbp: derived.cost_buffer_gbp,
            adjusted_purchasing_cost_gbp: derived.adjusted_purchasing_cost_gbp,
            weight_g: input.weight_g,
            weight_buffer_percent: input.weight_buffer_percent,
            freight_rate_per_kg: input.freight_rate_per_kg,
            freight_buffer_foreign: input.freight_buffer_foreign,
            freight_foreign: derived.freight_foreign,
            freight_gbp: derived.freight_gbp,
            import_duty_percent: input.import_duty_percent,
            import_duty_gbp: derived.import_duty_gbp,
            packaging_gbp: input.packaging_gbp,
            wholesale_cost_gbp: derived.wholesale_cost_gbp,
            direct_retail_price_gbp: input.direct_retail_price_gbp,
        }
    }

    /// Placeholder inputs for a product that only has prices set by hand
    pub fn minimal(wholesale_cost_gbp: Decimal, direct_retail_price_gbp: Decimal) -> Self {
        Self {
            exchange_rate: Decimal::ONE,
            unit_weight_g: Decimal::ONE,
            weight_g: Decimal::ONE,
            wholesale_cost_gbp,
            direct_retail_price_gbp,
            ..Default::default()
        }
    }

    /// Copy of a stored version, used as the base of the next one
    pub fn from_previous(cost: &ProductCost) -> Self {
        Self {
            exchange_rate: cost.exchange_rate,
            purchasing_cost_foreign: cost.purchasing_cost_foreign,
            purchasing_cost_gbp: cost.purchasing_cost_gbp,
            unit_weight_g: cost.unit_weight_g,
            purchasing_cost_buffer_percent: cost.purchasing_cost_buffer_percent,
            cost_buffer_gbp: cost.cost_buffer_gbp,
            adjusted_purchasing_cost_gbp: cost.adjusted_purchasing_cost_gbp,
            weight_g: cost.weight_g,
            weight_buffer_percent: cost.weight_buffer_percent,
            freight_rate_per_kg: cost.freight_rate_per_kg,
            freight_buffer_foreign: cost.freight_buffer_foreign,
            freight_foreign: cost.freight_foreign,
            freight_gbp: cost.freight_gbp,
            import_duty_percent: cost.import_duty_percent,
            import_duty_gbp: cost.import_duty_gbp,
            packaging_gbp: cost.packaging_gbp,
            wholesale_cost_gbp: cost.wholesale_cost_gbp,
            direct_retail_price_gbp: cost.direct_retail_price_gbp,
        }
    }
}

/// Override the derived prices without re-running the calculation
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCostRequest {
    #[validate(custom = "validate_amount")]
    pub wholesale_cost_gbp: Option<Decimal>,
    #[validate(custom = "validate_amount")]
    pub direct_retail_price_gbp: Option<Decimal>,
}

/// One version of a product's discount within a sector
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProductSectorDiscount {
    pub id: i32,
    pub product_id: i32,
    pub sector_id: i32,
    pub discount_percent: Decimal,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetDiscountRequest {
    #[validate(custom = "validate_percent")]
    pub discount_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PriceHistoryEntry {
    pub id: i64,
    pub product_id: i32,
    pub sector_id: Option<i32>,
    pub base_price_gbp: Decimal,
    pub discount_percent: Decimal,
    pub final_price_gbp: Decimal,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PriceHistoryQuery {
    pub sector_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unit_type_serialization() {
        assert_eq!(serde_json::to_string(&UnitType::Weight).unwrap(), "\"weight\"");
        assert_eq!(UnitType::default(), UnitType::Quantity);
        assert!(serde_json::from_str::<UnitType>("\"litre\"").is_err());
    }

    #[test]
    fn test_create_product_defaults_unit_type() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"name": "Oolong 100g"}"#).unwrap();
        assert_eq!(req.unit_type, UnitType::Quantity);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_discount_request_range() {
        assert!(SetDiscountRequest { discount_percent: dec!(12.5) }.validate().is_ok());
        assert!(SetDiscountRequest { discount_percent: dec!(100.1) }.validate().is_err());
        assert!(SetDiscountRequest { discount_percent: dec!(-1) }.validate().is_err());
    }

    #[test]
    fn test_set_cost_rejects_negative_inputs() {
        let req = SetCostRequest {
            exchange_rate: dec!(10),
            packaging_gbp: dec!(-0.5),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_decimals_accept_strings_and_numbers() {
        let req: SetDiscountRequest =
            serde_json::from_str(r#"{"discount_percent": "7.5"}"#).unwrap();
        assert_eq!(req.discount_percent, dec!(7.5));
        let req: SetDiscountRequest = serde_json::from_str(r#"{"discount_percent": 7.5}"#).unwrap();
        assert_eq!(req.discount_percent, dec!(7.5));
    }
}
