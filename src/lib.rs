// POS backend: catalog pricing, per-store stock, order capture and pickup,
// restock logistics, currency rates, and audit trails behind a JSON API.

pub mod audit;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod currency;
pub mod db;
pub mod devices;
pub mod error;
pub mod orders;
pub mod pricing;
pub mod stock;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::audit::AuditRepository;
use crate::auth::{AuthService, TokenService, UserRepository};
use crate::catalog::{CatalogRepository, CatalogService};
use crate::config::AppConfig;
use crate::currency::{CurrencyRepository, CurrencyService, RatesClient};
use crate::devices::{DeviceRepository, DeviceService};
use crate::orders::{OrderRepository, OrderService};
use crate::pricing::PricingService;
use crate::stock::{StockRepository, StockService};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        auth::handlers::login,
        auth::handlers::pin_login,
        auth::handlers::list_users,
        auth::handlers::get_user,
        auth::handlers::create_user,
        auth::handlers::update_user,
        auth::handlers::update_pin,
        catalog::handlers::list_products,
        catalog::handlers::get_product,
        catalog::handlers::create_product,
        catalog::handlers::update_product,
        catalog::handlers::delete_product,
        catalog::handlers::set_cost,
        catalog::handlers::update_cost,
        catalog::handlers::set_discount,
        catalog::handlers::remove_discount,
        catalog::handlers::list_discounts,
        catalog::handlers::price_history,
        catalog::handlers::list_sectors,
        catalog::handlers::get_sector,
        catalog::handlers::create_sector,
        catalog::handlers::update_sector,
        catalog::handlers::delete_sector,
        catalog::handlers::list_categories,
        catalog::handlers::create_category,
        catalog::handlers::rename_category,
        catalog::handlers::delete_category,
        pricing::handlers::quote,
        pricing::handlers::sector_catalog,
        orders::handlers::create_order,
        orders::handlers::list_orders,
        orders::handlers::get_order,
        orders::handlers::mark_paid,
        orders::handlers::mark_completed,
        orders::handlers::cancel_order,
        orders::handlers::pickup_order,
        orders::handlers::revenue_stats,
        orders::handlers::product_sales_stats,
        stock::handlers::list_stores,
        stock::handlers::create_store,
        stock::handlers::list_stock,
        stock::handlers::store_stock,
        stock::handlers::low_stock,
        stock::handlers::incoming_stock,
        stock::handlers::adjust_stock,
        stock::handlers::stock_report,
        stock::handlers::list_restock,
        stock::handlers::create_restock,
        stock::handlers::set_tracking,
        stock::handlers::receive_restock,
        stock::handlers::cancel_restock,
        currency::handlers::list_rates,
        currency::handlers::get_rate,
        currency::handlers::create_rate,
        currency::handlers::update_rate,
        currency::handlers::pin_rate,
        currency::handlers::delete_rate,
        currency::handlers::sync_rates,
        audit::handlers::stock_audit,
        audit::handlers::order_audit,
        devices::handlers::lookup_device,
        devices::handlers::register_device,
        devices::handlers::list_devices,
        devices::handlers::get_device,
        devices::handlers::store_devices,
    ),
    components(schemas(
        error::ErrorResponse,
        auth::models::Role,
        auth::models::UserResponse,
        auth::models::LoginRequest,
        auth::models::PinLoginRequest,
        auth::models::LoginResponse,
        auth::models::CreateUserRequest,
        auth::models::UpdateUserRequest,
        auth::models::UpdatePinRequest,
        audit::models::AuditLog,
        audit::models::AuditOutcome,
        catalog::discount_resolver::ResolvedDiscount,
        catalog::models::UnitType,
        catalog::models::Product,
        catalog::models::ProductDetail,
        catalog::models::CreateProductRequest,
        catalog::models::UpdateProductRequest,
        catalog::models::Sector,
        catalog::models::CreateSectorRequest,
        catalog::models::UpdateSectorRequest,
        catalog::models::ProductCost,
        catalog::models::SetCostRequest,
        catalog::models::UpdateCostRequest,
        catalog::models::ProductSectorDiscount,
        catalog::models::SetDiscountRequest,
        catalog::models::PriceHistoryEntry,
        catalog::models::Category,
        catalog::models::CreateCategoryRequest,
        catalog::models::RenameCategoryRequest,
        catalog::models::CategoryRenamed,
        catalog::models::CategoryDeleted,
        pricing::engine::LinePrice,
        pricing::engine::OrderTotals,
        pricing::models::LineRequest,
        pricing::models::QuoteRequest,
        pricing::models::QuoteResponse,
        pricing::models::CatalogEntry,
        pricing::models::SectorCatalog,
        orders::models::OrderStatus,
        orders::models::Order,
        orders::models::OrderItem,
        orders::models::CreateOrderRequest,
        orders::models::OrderDetail,
        orders::models::OrderWithStock,
        orders::models::PickupRequest,
        orders::models::PickupResponse,
        orders::models::DailyRevenue,
        orders::models::DailyProductSales,
        stock::models::Store,
        stock::models::CreateStoreRequest,
        stock::models::Stock,
        stock::models::StockLevel,
        stock::models::SnapshotKind,
        stock::models::AdjustStockRequest,
        stock::models::AdjustStockResponse,
        stock::models::StockReportRow,
        stock::models::IncomingStock,
        stock::models::StockEffect,
        stock::models::LineStockEffect,
        stock::models::RestockOrder,
        stock::models::RestockOrderItem,
        stock::models::RestockOrderDetail,
        stock::models::ReceiveRestockResponse,
        stock::models::RestockItemRequest,
        stock::models::CreateRestockRequest,
        stock::models::TrackingRequest,
        stock::restock::RestockStatus,
        currency::models::UpdatedBy,
        currency::models::CurrencyRate,
        currency::models::CreateRateRequest,
        currency::models::UpdateRateRequest,
        currency::models::PinRequest,
        currency::models::SyncResponse,
        devices::models::Device,
        devices::models::DeviceInfo,
        devices::models::RegisterDeviceRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login and user management"),
        (name = "catalog", description = "Products, sectors, costs and discounts"),
        (name = "pricing", description = "Quotes and sector catalogs"),
        (name = "orders", description = "Order capture, settlement and pickup"),
        (name = "reports", description = "Sales statistics"),
        (name = "stock", description = "Stores, stock levels and restock orders"),
        (name = "currency", description = "Exchange rates against GBP"),
        (name = "audit", description = "Audit trail queries"),
        (name = "devices", description = "Till registration and lookup"),
        (name = "health", description = "Liveness")
    ),
    info(
        title = "POS Backend API",
        version = "1.0.0",
        description = "Multi-store point-of-sale backend"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenService>,
    pub auth: AuthService,
    pub audit: AuditRepository,
    pub catalog: CatalogService,
    pub pricing: PricingService,
    pub orders: OrderService,
    pub stock: StockService,
    pub currency: CurrencyService,
    pub devices: DeviceService,
}

impl AppState {
    /// Wire every service onto one pool
    pub fn new(db: PgPool, config: &AppConfig) -> Self {
        let tokens = Arc::new(TokenService::new(
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
        ));

        Self {
            auth: AuthService::new(UserRepository::new(db.clone()), tokens.clone()),
            audit: AuditRepository::new(db.clone()),
            catalog: CatalogService::new(CatalogRepository::new(db.clone())),
            pricing: PricingService::new(db.clone()),
            orders: OrderService::new(OrderRepository::new(db.clone())),
            stock: StockService::new(StockRepository::new(db.clone())),
            currency: CurrencyService::new(
                CurrencyRepository::new(db.clone()),
                RatesClient::new(config.currency_api_url.clone()),
            ),
            devices: DeviceService::new(DeviceRepository::new(db.clone())),
            tokens,
            db,
        }
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "pos-backend"
    }))
}

/// Login and PIN login, throttled per peer address
fn login_routes(config: &AppConfig) -> Router<AppState> {
    let routes = Router::new()
        .route("/api/v1/auth/login", post(auth::handlers::login))
        .route("/api/v1/auth/pin-login", post(auth::handlers::pin_login));

    let interval_ms = (1000 / config.login_rate_per_second.max(1)).max(1);
    let governor = GovernorConfigBuilder::default()
        .per_millisecond(interval_ms)
        .burst_size(config.login_burst)
        .finish();

    match governor {
        // The layer borrows its config for the life of the process
        Some(governor) => routes.layer(GovernorLayer {
            config: Box::leak(Box::new(governor)),
        }),
        None => {
            warn!("Login rate limit disabled: burst size must be positive");
            routes
        }
    }
}

/// Creates and configures the application router
pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .merge(login_routes(config))
        .route(
            "/api/v1/device/:device_code",
            get(devices::handlers::lookup_device),
        )
        .merge(api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Every bearer-protected route
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // users
        .route(
            "/api/v1/users",
            get(auth::handlers::list_users).post(auth::handlers::create_user),
        )
        .route(
            "/api/v1/users/:id",
            get(auth::handlers::get_user).put(auth::handlers::update_user),
        )
        .route("/api/v1/users/:id/pin", put(auth::handlers::update_pin))
        // catalog
        .route(
            "/api/v1/products",
            get(catalog::handlers::list_products).post(catalog::handlers::create_product),
        )
        .route(
            "/api/v1/products/:id",
            get(catalog::handlers::get_product)
                .put(catalog::handlers::update_product)
                .delete(catalog::handlers::delete_product),
        )
        .route(
            "/api/v1/products/:id/cost",
            post(catalog::handlers::set_cost).put(catalog::handlers::update_cost),
        )
        .route(
            "/api/v1/products/:id/discounts",
            get(catalog::handlers::list_discounts),
        )
        .route(
            "/api/v1/products/:id/discounts/:sector_id",
            post(catalog::handlers::set_discount).delete(catalog::handlers::remove_discount),
        )
        .route(
            "/api/v1/products/:id/price-history",
            get(catalog::handlers::price_history),
        )
        .route(
            "/api/v1/sectors",
            get(catalog::handlers::list_sectors).post(catalog::handlers::create_sector),
        )
        .route(
            "/api/v1/sectors/:id",
            get(catalog::handlers::get_sector)
                .put(catalog::handlers::update_sector)
                .delete(catalog::handlers::delete_sector),
        )
        .route(
            "/api/v1/categories",
            get(catalog::handlers::list_categories).post(catalog::handlers::create_category),
        )
        .route(
            "/api/v1/categories/:name",
            delete(catalog::handlers::delete_category),
        )
        .route(
            "/api/v1/categories/:name/rename",
            put(catalog::handlers::rename_category),
        )
        // pricing
        .route("/api/v1/pricing/quote", post(pricing::handlers::quote))
        .route(
            "/api/v1/catalogs/:sector_id",
            get(pricing::handlers::sector_catalog),
        )
        // orders
        .route(
            "/api/v1/orders",
            get(orders::handlers::list_orders).post(orders::handlers::create_order),
        )
        .route(
            "/api/v1/orders/stats/revenue",
            get(orders::handlers::revenue_stats),
        )
        .route(
            "/api/v1/orders/stats/product-sales",
            get(orders::handlers::product_sales_stats),
        )
        .route(
            "/api/v1/orders/pickup/:order_number",
            put(orders::handlers::pickup_order),
        )
        .route("/api/v1/orders/:id", get(orders::handlers::get_order))
        .route("/api/v1/orders/:id/pay", put(orders::handlers::mark_paid))
        .route(
            "/api/v1/orders/:id/complete",
            put(orders::handlers::mark_completed),
        )
        .route("/api/v1/orders/:id/cancel", put(orders::handlers::cancel_order))
        // stores and stock
        .route(
            "/api/v1/stores",
            get(stock::handlers::list_stores).post(stock::handlers::create_store),
        )
        .route("/api/v1/stock", get(stock::handlers::list_stock))
        .route(
            "/api/v1/stock/store/:store_id",
            get(stock::handlers::store_stock),
        )
        .route("/api/v1/stock/low-stock", get(stock::handlers::low_stock))
        .route("/api/v1/stock/incoming", get(stock::handlers::incoming_stock))
        .route("/api/v1/stock/report", get(stock::handlers::stock_report))
        .route(
            "/api/v1/stock/:product_id/:store_id",
            put(stock::handlers::adjust_stock),
        )
        // restock
        .route(
            "/api/v1/restock-orders",
            get(stock::handlers::list_restock).post(stock::handlers::create_restock),
        )
        .route(
            "/api/v1/restock-orders/:id/tracking",
            put(stock::handlers::set_tracking),
        )
        .route(
            "/api/v1/restock-orders/:id/receive",
            put(stock::handlers::receive_restock),
        )
        .route(
            "/api/v1/restock-orders/:id/cancel",
            put(stock::handlers::cancel_restock),
        )
        // currency
        .route(
            "/api/v1/currency-rates",
            get(currency::handlers::list_rates).post(currency::handlers::create_rate),
        )
        .route(
            "/api/v1/currency-rates/sync",
            post(currency::handlers::sync_rates),
        )
        .route(
            "/api/v1/currency-rates/:code",
            get(currency::handlers::get_rate)
                .put(currency::handlers::update_rate)
                .delete(currency::handlers::delete_rate),
        )
        .route(
            "/api/v1/currency-rates/:code/pin",
            put(currency::handlers::pin_rate),
        )
        // devices
        .route(
            "/api/v1/devices",
            get(devices::handlers::list_devices).post(devices::handlers::register_device),
        )
        .route("/api/v1/devices/:id", get(devices::handlers::get_device))
        .route(
            "/api/v1/stores/:store_id/devices",
            get(devices::handlers::store_devices),
        )
        // audit
        .route("/api/v1/audit/stock", get(audit::handlers::stock_audit))
        .route("/api/v1/audit/order", get(audit::handlers::order_audit))
}

#[cfg(test)]
mod tests;
