use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Canonical form of a device code
///
/// Some tills report their code wrapped in braces (`{ABC-123}`). Both forms
/// name the same device, so the braces and surrounding whitespace are dropped.
pub fn normalize_device_code(raw: &str) -> String {
    let code = raw.trim();
    code.strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
        .unwrap_or(code)
        .trim()
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Device {
    pub id: i32,
    pub device_code: String,
    pub store_id: i32,
    pub device_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a till learns about itself before anyone has logged in
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DeviceInfo {
    pub device_code: String,
    pub device_name: Option<String>,
    pub store_id: i32,
    pub store_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterDeviceRequest {
    #[validate(length(min = 1, max = 100, message = "Device code is required"))]
    pub device_code: String,
    pub store_id: i32,
    #[validate(length(max = 100))]
    pub device_name: Option<String>,
}
