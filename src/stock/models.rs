// Stock, store, and restock data models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::audit::AuditOutcome;
use crate::stock::restock::RestockStatus;
use crate::validation::{validate_quantity, validate_stock_quantity};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Store {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStoreRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

/// Stock row as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Stock {
    pub id: i32,
    pub product_id: i32,
    pub store_id: i32,
    pub quantity: Decimal,
    pub low_stock_threshold: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Stock row with product and store names for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StockLevel {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub store_id: i32,
    pub store_name: String,
    pub quantity: Decimal,
    pub low_stock_threshold: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StockQuery {
    pub store_id: Option<i32>,
}

/// Which end of the trading day a snapshot records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    DayStart,
    DayEnd,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::DayStart => "day_start",
            SnapshotKind::DayEnd => "day_end",
        }
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overwrite a stock quantity
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustStockRequest {
    #[validate(custom = "validate_stock_quantity")]
    pub quantity: Decimal,
    #[validate(custom = "validate_stock_quantity")]
    pub low_stock_threshold: Option<Decimal>,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    /// Also record the new quantity as today's day-start or day-end count
    pub snapshot: Option<SnapshotKind>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdjustStockResponse {
    pub stock: Stock,
    pub previous_quantity: Decimal,
    pub audit: AuditOutcome,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StockReportQuery {
    /// Report day, `YYYY-MM-DD`; defaults to today (UTC)
    pub date: Option<NaiveDate>,
    pub store_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StockReportRow {
    pub product_id: i32,
    pub product_name: String,
    pub store_id: i32,
    pub store_name: String,
    pub day_start_quantity: Option<Decimal>,
    pub day_end_quantity: Option<Decimal>,
}

/// Quantity on open restock orders for a product at a store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IncomingStock {
    pub product_id: i32,
    pub store_id: i32,
    pub quantity: Decimal,
}

/// What a stock mutation did to one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StockEffect {
    Applied { previous: Decimal, current: Decimal },
    Skipped { reason: String },
}

impl StockEffect {
    pub fn is_applied(&self) -> bool {
        matches!(self, StockEffect::Applied { .. })
    }

    /// How much the movement took out of stock; zero when it was skipped
    /// or the ledger was already at the floor
    pub fn taken(&self) -> Decimal {
        match self {
            StockEffect::Applied { previous, current } if previous > current => previous - current,
            _ => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LineStockEffect {
    pub product_id: i32,
    pub effect: StockEffect,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RestockOrder {
    pub id: i32,
    pub store_id: i32,
    pub status: RestockStatus,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RestockOrderItem {
    pub id: i32,
    pub restock_order_id: i32,
    pub product_id: i32,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestockOrderDetail {
    #[serde(flatten)]
    pub order: RestockOrder,
    pub items: Vec<RestockOrderItem>,
}

/// Restock receipt: the updated order plus what happened to each stock row
#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiveRestockResponse {
    pub order: RestockOrderDetail,
    pub stock_effects: Vec<LineStockEffect>,
    pub audit: Vec<AuditOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RestockItemRequest {
    pub product_id: i32,
    #[validate(custom = "validate_quantity")]
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRestockRequest {
    pub store_id: i32,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    #[validate]
    pub items: Vec<RestockItemRequest>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TrackingRequest {
    #[validate(length(min = 1, max = 100, message = "Tracking number is required"))]
    pub tracking_number: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RestockQuery {
    pub status: Option<RestockStatus>,
    pub store_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_stock_effect_serialization() {
        let applied = StockEffect::Applied {
            previous: dec!(5),
            current: dec!(2),
        };
        assert_eq!(
            serde_json::to_value(&applied).unwrap(),
            json!({"status": "applied", "previous": "5", "current": "2"})
        );
        assert!(applied.is_applied());

        let skipped = StockEffect::Skipped {
            reason: "no stock row".into(),
        };
        assert!(!skipped.is_applied());
    }

    #[test]
    fn test_snapshot_kind_wire_format() {
        assert_eq!(serde_json::to_string(&SnapshotKind::DayStart).unwrap(), "\"day_start\"");
        let req: AdjustStockRequest =
            serde_json::from_str(r#"{"quantity": "12", "snapshot": "day_end"}"#).unwrap();
        assert_eq!(req.snapshot, Some(SnapshotKind::DayEnd));
    }

    #[test]
    fn test_adjust_rejects_negative_quantity() {
        let req: AdjustStockRequest = serde_json::from_str(r#"{"quantity": "-1"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_restock_requires_positive_items() {
        let req = CreateRestockRequest {
            store_id: 1,
            notes: None,
            items: vec![RestockItemRequest {
                product_id: 1,
                quantity: dec!(0),
            }],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_restock_requires_at_least_one_item() {
        let req = CreateRestockRequest {
            store_id: 1,
            notes: None,
            items: Vec::new(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));

        let ok = CreateRestockRequest {
            store_id: 1,
            notes: Some("weekly top-up".into()),
            items: vec![RestockItemRequest {
                product_id: 4,
                quantity: dec!(12),
            }],
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_taken_is_what_left_the_shelf() {
        // Ordering 8 against 5 on hand floors at zero and takes only 5
        let floored = StockEffect::Applied {
            previous: dec!(5),
            current: dec!(0),
        };
        assert_eq!(floored.taken(), dec!(5));

        let partial = StockEffect::Applied {
            previous: dec!(5),
            current: dec!(2),
        };
        assert_eq!(partial.taken(), dec!(3));

        let empty = StockEffect::Applied {
            previous: dec!(0),
            current: dec!(0),
        };
        assert_eq!(empty.taken(), dec!(0));

        let skipped = StockEffect::Skipped {
            reason: "no stock row".into(),
        };
        assert_eq!(skipped.taken(), dec!(0));
    }
}
