use sqlx::{PgConnection, PgPool};

use crate::devices::{
    error::DeviceError,
    models::{Device, DeviceInfo},
};

const DEVICE_COLUMNS: &str =
    "id, device_code, store_id, device_name, is_active, created_at, updated_at";

/// Repository for the pos_devices table
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list(&self, store_id: Option<i32>) -> Result<Vec<Device>, DeviceError> {
        let devices = sqlx::query_as::<_, Device>(&format!(
            r#"
            SELECT {DEVICE_COLUMNS} FROM pos_devices
            WHERE ($1::int IS NULL OR store_id = $1)
            ORDER BY store_id, device_code
            "#
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(devices)
    }

    pub async fn find(&self, id: i32) -> Result<Option<Device>, DeviceError> {
        let device = sqlx::query_as::<_, Device>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM pos_devices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(device)
    }

    /// Active device with its store, keyed by normalized code
    pub async fn find_active_info(&self, code: &str) -> Result<Option<DeviceInfo>, DeviceError> {
        let info = sqlx::query_as::<_, DeviceInfo>(
            r#"
            SELECT d.device_code, d.device_name, d.store_id, s.name AS store_name
            FROM pos_devices d
            JOIN stores s ON s.id = d.store_id
            WHERE d.device_code = $1 AND d.is_active
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(info)
    }

    pub async fn store_exists(conn: &mut PgConnection, id: i32) -> Result<bool, DeviceError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }

    /// Returns `None` when the code is already taken
    pub async fn insert(
        conn: &mut PgConnection,
        code: &str,
        store_id: i32,
        device_name: Option<&str>,
    ) -> Result<Option<Device>, DeviceError> {
        let device = sqlx::query_as::<_, Device>(&format!(
            r#"
            INSERT INTO pos_devices (device_code, store_id, device_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (device_code) DO NOTHING
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(store_id)
        .bind(device_name)
        .fetch_optional(conn)
        .await?;

        Ok(device)
    }
}
