use sqlx::PgPool;

use crate::audit::models::AuditLog;

/// Rows returned by audit trail queries
pub const AUDIT_QUERY_LIMIT: i64 = 100;

/// Read side of the audit trail
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Entries for one entity, newest first; `action` narrows further when given
    pub async fn find_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
        action: Option<&str>,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT a.id, a.user_id, u.username, a.action, a.entity_type, a.entity_id,
                   a.changes, a.ip_address, a.user_agent, a.created_at
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.entity_type = $1
              AND a.entity_id = $2
              AND ($3::text IS NULL OR a.action = $3)
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $4
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .bind(action)
        .bind(AUDIT_QUERY_LIMIT)
        .fetch_all(&self.pool)
        .await
    }

    /// Stock entries for every stock row in a store, newest first
    pub async fn find_stock_for_store(&self, store_id: i32) -> Result<Vec<AuditLog>, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT a.id, a.user_id, u.username, a.action, a.entity_type, a.entity_id,
                   a.changes, a.ip_address, a.user_agent, a.created_at
            FROM audit_logs a
            JOIN stock s ON a.entity_id = s.id::text
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.entity_type = 'stock'
              AND a.action = 'stock_update'
              AND s.store_id = $1
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $2
            "#,
        )
        .bind(store_id)
        .bind(AUDIT_QUERY_LIMIT)
        .fetch_all(&self.pool)
        .await
    }

    /// Stock entries for every store holding a product, newest first
    pub async fn find_stock_for_product(
        &self,
        product_id: i32,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT a.id, a.user_id, u.username, a.action, a.entity_type, a.entity_id,
                   a.changes, a.ip_address, a.user_agent, a.created_at
            FROM audit_logs a
            JOIN stock s ON a.entity_id = s.id::text
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.entity_type = 'stock'
              AND a.action = 'stock_update'
              AND s.product_id = $1
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $2
            "#,
        )
        .bind(product_id)
        .bind(AUDIT_QUERY_LIMIT)
        .fetch_all(&self.pool)
        .await
    }

    /// Id of the stock row for (product, store), if one exists
    pub async fn stock_id(&self, product_id: i32, store_id: i32) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>("SELECT id FROM stock WHERE product_id = $1 AND store_id = $2")
            .bind(product_id)
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await
    }
}
