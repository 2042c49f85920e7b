use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::currency::{
    error::CurrencyError,
    models::{CurrencyRate, UpdatedBy},
    sync::RateWrite,
};

const RATE_COLUMNS: &str = "currency_code, rate_to_gbp, is_pinned, last_updated, updated_by";

/// Repository for the currency_rates table
#[derive(Clone)]
pub struct CurrencyRepository {
    pool: PgPool,
}

impl CurrencyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pinned rates first, then alphabetical
    pub async fn list(&self) -> Result<Vec<CurrencyRate>, CurrencyError> {
        let rates = sqlx::query_as::<_, CurrencyRate>(&format!(
            "SELECT {RATE_COLUMNS} FROM currency_rates ORDER BY is_pinned DESC, currency_code"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rates)
    }

    pub async fn find(&self, code: &str) -> Result<Option<CurrencyRate>, CurrencyError> {
        let rate = sqlx::query_as::<_, CurrencyRate>(&format!(
            "SELECT {RATE_COLUMNS} FROM currency_rates WHERE currency_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rate)
    }

    /// Insert a manual rate; returns `None` when the code already exists
    pub async fn insert(
        &self,
        code: &str,
        rate: Decimal,
        is_pinned: bool,
    ) -> Result<Option<CurrencyRate>, CurrencyError> {
        let rate = sqlx::query_as::<_, CurrencyRate>(&format!(
            r#"
            INSERT INTO currency_rates (currency_code, rate_to_gbp, is_pinned, last_updated, updated_by)
            VALUES ($1, $2, $3, NOW(), $4)
            ON CONFLICT (currency_code) DO NOTHING
            RETURNING {RATE_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(rate)
        .bind(is_pinned)
        .bind(UpdatedBy::Manual)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rate)
    }

    pub async fn update(
        &self,
        code: &str,
        rate: Decimal,
        is_pinned: Option<bool>,
    ) -> Result<Option<CurrencyRate>, CurrencyError> {
        let rate = sqlx::query_as::<_, CurrencyRate>(&format!(
            r#"
            UPDATE currency_rates
            SET rate_to_gbp = $2,
                is_pinned = COALESCE($3, is_pinned),
                last_updated = NOW(),
                updated_by = $4
            WHERE currency_code = $1
            RETURNING {RATE_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(rate)
        .bind(is_pinned)
        .bind(UpdatedBy::Manual)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rate)
    }

    /// Pinning leaves the rate and its provenance alone
    pub async fn set_pinned(
        &self,
        code: &str,
        is_pinned: bool,
    ) -> Result<Option<CurrencyRate>, CurrencyError> {
        let rate = sqlx::query_as::<_, CurrencyRate>(&format!(
            r#"
            UPDATE currency_rates
            SET is_pinned = $2, last_updated = NOW()
            WHERE currency_code = $1
            RETURNING {RATE_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(is_pinned)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rate)
    }

    pub async fn delete(&self, code: &str) -> Result<bool, CurrencyError> {
        let result = sqlx::query("DELETE FROM currency_rates WHERE currency_code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ----- sync, inside a transaction -----

    pub async fn lock_all(conn: &mut PgConnection) -> Result<Vec<CurrencyRate>, CurrencyError> {
        let rates = sqlx::query_as::<_, CurrencyRate>(&format!(
            "SELECT {RATE_COLUMNS} FROM currency_rates FOR UPDATE"
        ))
        .fetch_all(conn)
        .await?;
        Ok(rates)
    }

    pub async fn upsert_synced(
        conn: &mut PgConnection,
        write: &RateWrite,
        at: DateTime<Utc>,
    ) -> Result<(), CurrencyError> {
        sqlx::query(
            r#"
            INSERT INTO currency_rates (currency_code, rate_to_gbp, is_pinned, last_updated, updated_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (currency_code) DO UPDATE
            SET rate_to_gbp = EXCLUDED.rate_to_gbp,
                is_pinned = EXCLUDED.is_pinned,
                last_updated = EXCLUDED.last_updated,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(&write.currency_code)
        .bind(write.rate_to_gbp)
        .bind(write.is_pinned)
        .bind(at)
        .bind(UpdatedBy::ApiSync)
        .execute(conn)
        .await?;
        Ok(())
    }
}
