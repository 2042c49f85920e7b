use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::audit::AuditOutcome;
use crate::pricing::models::LineRequest;
use crate::stock::LineStockEffect;

/// Order status enum representing the lifecycle of an order
///
/// `PickedUp` is only found on rows written by older tills; pickup now
/// stores `Completed` together with `picked_up_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Completed,
    Cancelled,
    PickedUp,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::PickedUp,
    ];

    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::PickedUp => "picked_up",
        }
    }

    /// Statuses counted as sales in revenue reports
    pub fn counts_as_sale(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Completed | OrderStatus::PickedUp
        )
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order database model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub store_id: i32,
    pub user_id: i32,
    pub device_code: Option<String>,
    pub sector_id: Option<i32>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub invoice_check_code: String,
    pub receipt_check_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
}

/// Order line as priced at creation time
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: Uuid,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub line_total: Decimal,
    /// Stock taken for this line when the order was created
    pub reserved_quantity: Decimal,
}

/// Request to create a new order
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub store_id: i32,
    pub sector_id: Option<i32>,
    #[validate(length(max = 100))]
    pub device_code: Option<String>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    #[validate]
    pub items: Vec<LineRequest>,
}

/// Order with its line items
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Order plus what happened to stock for each line
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithStock {
    #[serde(flatten)]
    pub detail: OrderDetail,
    pub stock_effects: Vec<LineStockEffect>,
}

/// Codes scanned from the printed invoice and receipt
///
/// Accepted as query parameters or as a JSON body.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct PickupRequest {
    pub invoice_check_code: Option<String>,
    pub receipt_check_code: Option<String>,
}

impl PickupRequest {
    pub fn is_empty(&self) -> bool {
        self.invoice_check_code.as_deref().map_or(true, str::is_empty)
            && self.receipt_check_code.as_deref().map_or(true, str::is_empty)
    }

    /// Both codes, when both were supplied and non-empty
    pub fn codes(&self) -> Option<(&str, &str)> {
        match (
            self.invoice_check_code.as_deref(),
            self.receipt_check_code.as_deref(),
        ) {
            (Some(invoice), Some(receipt)) if !invoice.is_empty() && !receipt.is_empty() => {
                Some((invoice, receipt))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PickupResponse {
    pub order: OrderDetail,
    pub audit: AuditOutcome,
}

pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 1000;

/// Filters for order listings
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OrderListQuery {
    pub store_id: Option<i32>,
    pub status: Option<OrderStatus>,
    pub user_id: Option<i32>,
    /// Inclusive start day, `YYYY-MM-DD`
    pub start_date: Option<NaiveDate>,
    /// Inclusive end day, `YYYY-MM-DD`
    pub end_date: Option<NaiveDate>,
    /// 1 to 1000, default 100; out-of-range values fall back to the default
    pub limit: Option<i64>,
}

impl OrderListQuery {
    pub fn effective_limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 && limit <= MAX_LIST_LIMIT => limit,
            _ => DEFAULT_LIST_LIMIT,
        }
    }
}

pub const DEFAULT_STATS_DAYS: i64 = 30;
pub const MAX_STATS_DAYS: i64 = 365;

/// Reporting window, either the last `days` or an explicit date range
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StatsQuery {
    /// 1 to 365, default 30; ignored when both dates are given
    pub days: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub store_id: Option<i32>,
}

impl StatsQuery {
    /// Inclusive day range this query covers, relative to `today`
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end < start => (end, start),
            (Some(start), Some(end)) => (start, end),
            _ => {
                let days = match self.days {
                    Some(days) if (1..=MAX_STATS_DAYS).contains(&days) => days,
                    _ => DEFAULT_STATS_DAYS,
                };
                (today - Duration::days(days), today)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub order_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DailyProductSales {
    pub date: NaiveDate,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: Decimal,
    pub revenue: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&OrderStatus::PickedUp).unwrap(), "\"picked_up\"");
        let status: OrderStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(status, OrderStatus::Paid);
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_sale_statuses() {
        assert!(!OrderStatus::Pending.counts_as_sale());
        assert!(OrderStatus::Paid.counts_as_sale());
        assert!(OrderStatus::Completed.counts_as_sale());
        assert!(OrderStatus::PickedUp.counts_as_sale());
        assert!(!OrderStatus::Cancelled.counts_as_sale());
    }

    #[test]
    fn test_create_order_requires_items() {
        let req = CreateOrderRequest {
            store_id: 1,
            sector_id: None,
            device_code: None,
            items: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_order_rejects_zero_quantity() {
        let req = CreateOrderRequest {
            store_id: 1,
            sector_id: Some(2),
            device_code: None,
            items: vec![LineRequest {
                product_id: 1,
                quantity: dec!(0),
            }],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_pickup_codes_need_both() {
        let only_invoice = PickupRequest {
            invoice_check_code: Some("1234".into()),
            receipt_check_code: None,
        };
        assert!(only_invoice.codes().is_none());
        assert!(!only_invoice.is_empty());

        let both = PickupRequest {
            invoice_check_code: Some("1234".into()),
            receipt_check_code: Some("5678".into()),
        };
        assert_eq!(both.codes(), Some(("1234", "5678")));

        let blank = PickupRequest {
            invoice_check_code: Some(String::new()),
            receipt_check_code: Some(String::new()),
        };
        assert!(blank.codes().is_none());
        assert!(blank.is_empty());
    }

    #[test]
    fn test_list_limit_bounds() {
        let mut query = OrderListQuery::default();
        assert_eq!(query.effective_limit(), 100);
        query.limit = Some(250);
        assert_eq!(query.effective_limit(), 250);
        query.limit = Some(5000);
        assert_eq!(query.effective_limit(), 100);
        query.limit = Some(0);
        assert_eq!(query.effective_limit(), 100);
    }

    #[test]
    fn test_stats_default_window() {
        let today = day(2024, 3, 31);
        let (start, end) = StatsQuery::default().date_range(today);
        assert_eq!(start, day(2024, 3, 1));
        assert_eq!(end, today);
    }

    #[test]
    fn test_stats_days_out_of_range_falls_back() {
        let today = day(2024, 3, 31);
        let query = StatsQuery {
            days: Some(400),
            ..Default::default()
        };
        assert_eq!(query.date_range(today).0, day(2024, 3, 1));

        let query = StatsQuery {
            days: Some(7),
            ..Default::default()
        };
        assert_eq!(query.date_range(today).0, day(2024, 3, 24));
    }

    #[test]
    fn test_stats_swapped_dates_are_normalised() {
        let query = StatsQuery {
            start_date: Some(day(2024, 2, 10)),
            end_date: Some(day(2024, 2, 1)),
            ..Default::default()
        };
        assert_eq!(
            query.date_range(day(2024, 3, 31)),
            (day(2024, 2, 1), day(2024, 2, 10))
        );
    }

    #[test]
    fn test_stats_single_date_uses_days() {
        let query = StatsQuery {
            start_date: Some(day(2024, 2, 10)),
            days: Some(10),
            ..Default::default()
        };
        assert_eq!(query.date_range(day(2024, 3, 31)).0, day(2024, 3, 21));
    }
}
