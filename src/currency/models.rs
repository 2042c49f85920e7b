// Currency rate models and the exchange-rate feed payload

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::{validate_currency_code, validate_positive};

/// Who last wrote a rate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UpdatedBy {
    Manual,
    ApiSync,
}

impl UpdatedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdatedBy::Manual => "manual",
            UpdatedBy::ApiSync => "api_sync",
        }
    }
}

impl Default for UpdatedBy {
    fn default() -> Self {
        UpdatedBy::Manual
    }
}

impl std::fmt::Display for UpdatedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Units of the currency per one pound sterling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CurrencyRate {
    pub currency_code: String,
    pub rate_to_gbp: Decimal,
    pub is_pinned: bool,
    pub last_updated: DateTime<Utc>,
    pub updated_by: UpdatedBy,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRateRequest {
    #[validate(custom = "validate_currency_code")]
    pub currency_code: String,
    #[validate(custom = "validate_positive")]
    pub rate_to_gbp: Decimal,
    #[serde(default)]
    pub is_pinned: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRateRequest {
    #[validate(custom = "validate_positive")]
    pub rate_to_gbp: Decimal,
    /// Left unchanged when absent
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PinRequest {
    pub is_pinned: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    pub updated_count: usize,
    pub sync_date: DateTime<Utc>,
}

/// Body returned by the exchange-rate feed
///
/// `rates` is keyed by currency code, quoted against `base`.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesFeed {
    pub base: String,
    #[serde(default)]
    pub date: Option<String>,
    pub rates: BTreeMap<String, Decimal>,
}
