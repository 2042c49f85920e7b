// Audit trail data models

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Audit log row joined with the acting user's name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    #[schema(value_type = Object)]
    pub changes: JsonValue,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An entry waiting to be written to the audit trail
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Option<i32>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub changes: JsonValue,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditEntry {
    pub fn new(
        action: &str,
        entity_type: &str,
        entity_id: impl ToString,
        changes: JsonValue,
    ) -> Self {
        Self {
            user_id: None,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            changes,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn by(mut self, user_id: i32) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_meta(mut self, meta: &RequestMeta) -> Self {
        self.ip_address = meta.ip_address.clone();
        self.user_agent = meta.user_agent.clone();
        self
    }
}

/// Result of a best-effort audit write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Applied { audit_id: i64 },
    Skipped { reason: String },
}

impl AuditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, AuditOutcome::Applied { .. })
    }
}

/// Client metadata recorded with audit entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn from_parts(parts: &Parts) -> Self {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        // First hop of X-Forwarded-For is the original client
        let ip_address = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| header("x-real-ip"))
            .map(str::to_string);

        Self {
            ip_address,
            user_agent: header("user-agent").map(str::to_string),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestMeta::from_parts(parts))
    }
}

/// Filters for the stock audit trail
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StockAuditQuery {
    pub product_id: Option<i32>,
    pub store_id: Option<i32>,
    pub entity_id: Option<String>,
}

/// Filters for the order audit trail
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OrderAuditQuery {
    pub order_id: Option<String>,
    pub entity_id: Option<String>,
}
