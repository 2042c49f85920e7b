// Audit Logger
//
// Writes audit entries inside the caller's transaction. Each insert runs
// under its own savepoint so a failed audit write never poisons the
// surrounding operation.

use sqlx::{Connection, PgConnection};
use tracing::{debug, warn};

use crate::audit::models::{AuditEntry, AuditOutcome};

pub struct AuditLogger;

impl AuditLogger {
    /// Record `entry` on `conn`, returning `Skipped` instead of an error on failure
    pub async fn record(conn: &mut PgConnection, entry: &AuditEntry) -> AuditOutcome {
        let mut savepoint = match conn.begin().await {
            Ok(savepoint) => savepoint,
            Err(e) => return Self::skipped(entry, e),
        };

        match Self::insert(&mut savepoint, entry).await {
            Ok(audit_id) => match savepoint.commit().await {
                Ok(()) => {
                    debug!(
                        "Audit {} recorded for {} {}",
                        entry.action, entry.entity_type, entry.entity_id
                    );
                    AuditOutcome::Applied { audit_id }
                }
                Err(e) => Self::skipped(entry, e),
            },
            Err(e) => {
                if let Err(rollback_err) = savepoint.rollback().await {
                    warn!("Audit savepoint rollback failed: {}", rollback_err);
                }
                Self::skipped(entry, e)
            }
        }
    }

    async fn insert(conn: &mut PgConnection, entry: &AuditEntry) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO audit_logs (user_id, action, entity_type, entity_id, changes, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.changes)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .fetch_one(conn)
        .await
    }

    fn skipped(entry: &AuditEntry, err: sqlx::Error) -> AuditOutcome {
        warn!(
            "Failed to write audit {} for {} {}: {}",
            entry.action, entry.entity_type, entry.entity_id, err
        );
        AuditOutcome::Skipped {
            reason: format!("audit write failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skipped_outcome_carries_reason() {
        let entry = AuditEntry::new("order_pickup", "order", "abc", json!({}));
        let outcome = AuditLogger::skipped(&entry, sqlx::Error::RowNotFound);
        match outcome {
            AuditOutcome::Skipped { reason } => assert!(reason.starts_with("audit write failed")),
            other => panic!("Expected Skipped, got {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_failed_insert_keeps_outer_transaction_usable() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let pool = crate::db::create_pool(&url, 1).await.unwrap();
        let mut tx = pool.begin().await.unwrap();

        // user 0 does not exist, so the foreign key rejects the insert
        let entry = AuditEntry::new("stock_update", "stock", 1, json!({})).by(0);
        let outcome = AuditLogger::record(&mut tx, &entry).await;
        assert!(!outcome.is_applied());

        let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&mut *tx).await.unwrap();
        assert_eq!(one, 1);
        tx.rollback().await.unwrap();
    }
}
