use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::pricing::engine::{LinePrice, OrderTotals};
use crate::validation::validate_quantity;

/// Product and quantity to price
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct LineRequest {
    pub product_id: i32,
    #[validate(custom = "validate_quantity")]
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QuoteRequest {
    pub sector_id: Option<i32>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    #[validate]
    pub items: Vec<LineRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    pub sector_id: Option<i32>,
    pub lines: Vec<LinePrice>,
    pub totals: OrderTotals,
}

/// One product of a sector's priced catalog
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogEntry {
    pub product_id: i32,
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub base_price: Decimal,
    pub sector_rate: Decimal,
    pub product_sector_rate: Decimal,
    pub discount_percent: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SectorCatalog {
    pub sector_id: i32,
    pub sector_name: String,
    pub items: Vec<CatalogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_requires_items() {
        let req = QuoteRequest {
            sector_id: None,
            items: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_quote_rejects_non_positive_quantity() {
        let req = QuoteRequest {
            sector_id: Some(1),
            items: vec![LineRequest {
                product_id: 1,
                quantity: dec!(0),
            }],
        };
        assert!(req.validate().is_err());

        let ok = QuoteRequest {
            sector_id: Some(1),
            items: vec![LineRequest {
                product_id: 1,
                quantity: dec!(0.5),
            }],
        };
        assert!(ok.validate().is_ok());
    }
}
