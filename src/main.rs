use std::net::SocketAddr;

use pos_backend::{config::AppConfig, create_router, db, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pos_backend=debug,tower_http=info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("POS API - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");

    tracing::info!("Connecting to database...");
    let db_pool = db::connect_with_retry(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let state = AppState::new(db_pool, &config);
    let app = create_router(state, &config);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("POS API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    // Peer addresses feed the login rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
