use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Attempts made to reach the database at start-up
const CONNECT_ATTEMPTS: u32 = 5;

/// Pause between start-up connection attempts
const CONNECT_BACKOFF: Duration = Duration::from_secs(2);

/// Creates and configures a PostgreSQL connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
/// * `max_connections` - Upper bound on pooled connections
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Creates the pool, retrying a bounded number of times
///
/// The database container frequently comes up after the API does, so the
/// first few refusals are expected. The last error is returned once the
/// attempts are exhausted.
pub async fn connect_with_retry(
    database_url: &str,
    max_connections: u32,
) -> Result<DbPool, sqlx::Error> {
    let mut attempt = 1;
    loop {
        match create_pool(database_url, max_connections).await {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                tracing::warn!(
                    "Database connection attempt {}/{} failed: {}",
                    attempt,
                    CONNECT_ATTEMPTS,
                    e
                );
                tokio::time::sleep(CONNECT_BACKOFF).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Pool that connects on first use
///
/// Lets router-level tests exercise paths that are rejected before any
/// query runs without a live database.
pub fn lazy_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy(database_url)
}
