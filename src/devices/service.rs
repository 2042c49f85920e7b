use tracing::{debug, info};

use crate::devices::{
    error::DeviceError,
    models::{normalize_device_code, Device, DeviceInfo, RegisterDeviceRequest},
    repository::DeviceRepository,
};

/// Service layer for till registration and lookup
#[derive(Clone)]
pub struct DeviceService {
    repo: DeviceRepository,
}

impl DeviceService {
    pub fn new(repo: DeviceRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, store_id: Option<i32>) -> Result<Vec<Device>, DeviceError> {
        self.repo.list(store_id).await
    }

    pub async fn get(&self, id: i32) -> Result<Device, DeviceError> {
        self.repo
            .find(id)
            .await?
            .ok_or_else(|| DeviceError::NotFound(id.to_string()))
    }

    /// Resolve a till's code to its store. Inactive devices are not found.
    pub async fn lookup(&self, raw_code: &str) -> Result<DeviceInfo, DeviceError> {
        let code = normalize_device_code(raw_code);
        if code.is_empty() {
            return Err(DeviceError::InvalidInput("Device code is required".into()));
        }
        debug!("Looking up device {}", code);
        self.repo
            .find_active_info(&code)
            .await?
            .ok_or(DeviceError::NotFound(code))
    }

    pub async fn register(&self, req: RegisterDeviceRequest) -> Result<Device, DeviceError> {
        let code = normalize_device_code(&req.device_code);
        if code.is_empty() {
            return Err(DeviceError::InvalidInput("Device code is required".into()));
        }
        let name = req
            .device_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let mut tx = self.repo.pool().begin().await?;
        if !DeviceRepository::store_exists(&mut tx, req.store_id).await? {
            return Err(DeviceError::StoreNotFound(req.store_id));
        }
        let device = DeviceRepository::insert(&mut tx, &code, req.store_id, name)
            .await?
            .ok_or_else(|| DeviceError::AlreadyRegistered(code.clone()))?;
        tx.commit().await?;

        info!("Registered device {} at store {}", device.device_code, device.store_id);
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (DeviceService, sqlx::PgPool) {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let pool = crate::db::create_pool(&url, 2).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        (DeviceService::new(DeviceRepository::new(pool.clone())), pool)
    }

    async fn seed_store(pool: &sqlx::PgPool, name: &str) -> i32 {
        sqlx::query_scalar("INSERT INTO stores (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_register_and_lookup_device() {
        let (service, pool) = setup().await;
        let store_id = seed_store(&pool, "Harbour Road").await;
        let code = format!("TILL-{}", uuid::Uuid::new_v4());

        let device = service
            .register(RegisterDeviceRequest {
                device_code: format!("{{{}}}", code),
                store_id,
                device_name: Some("  Front counter ".into()),
            })
            .await
            .unwrap();
        assert_eq!(device.device_code, code);
        assert_eq!(device.device_name.as_deref(), Some("Front counter"));
        assert!(device.is_active);

        // Same till reporting its bare code
        let dup = service
            .register(RegisterDeviceRequest {
                device_code: code.clone(),
                store_id,
                device_name: None,
            })
            .await;
        assert!(matches!(dup, Err(DeviceError::AlreadyRegistered(_))));

        let info = service.lookup(&format!("{{{}}}", code)).await.unwrap();
        assert_eq!(info.store_id, store_id);
        assert_eq!(info.store_name, "Harbour Road");

        let listed = service.list(Some(store_id)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(service.get(device.id).await.unwrap().device_code, code);

        sqlx::query("UPDATE pos_devices SET is_active = FALSE WHERE id = $1")
            .bind(device.id)
            .execute(&pool)
            .await
            .unwrap();
        assert!(matches!(
            service.lookup(&code).await,
            Err(DeviceError::NotFound(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_register_at_unknown_store_fails() {
        let (service, _pool) = setup().await;
        let result = service
            .register(RegisterDeviceRequest {
                device_code: format!("TILL-{}", uuid::Uuid::new_v4()),
                store_id: -1,
                device_name: None,
            })
            .await;
        assert!(matches!(result, Err(DeviceError::StoreNotFound(-1))));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_blank_code_is_rejected_before_lookup() {
        let (service, _pool) = setup().await;
        assert!(matches!(
            service.lookup(" {} ").await,
            Err(DeviceError::InvalidInput(_))
        ));
    }
}
