// HTTP handlers for products, sectors, costs, and discounts

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use validator::Validate;

use crate::auth::{AuthenticatedUser, Capability};
use crate::catalog::models::{
    Category, CategoryDeleted, CategoryRenamed, CreateCategoryRequest, CreateProductRequest,
    CreateSectorRequest, PriceHistoryEntry, PriceHistoryQuery, Product, ProductCost,
    ProductDetail, ProductQuery, ProductSectorDiscount, RenameCategoryRequest, Sector,
    SetCostRequest, SetDiscountRequest, UpdateCostRequest, UpdateProductRequest,
    UpdateSectorRequest,
};
use crate::error::ApiError;
use crate::AppState;

/// List active products, optionally within one category
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductQuery),
    responses((status = 200, body = [Product])),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    debug!("Listing products, category={:?}", query.category);
    Ok(Json(state.catalog.list_products(query.category.as_deref()).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, body = ProductDetail),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<ProductDetail>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.get_product(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, body = Product),
        (status = 400, body = ErrorResponse),
        (status = 409, description = "Duplicate barcode or SKU", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    user.require(Capability::ManageCatalog)?;
    request.validate()?;
    let product = state.catalog.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, body = Product),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    user.require(Capability::ManageCatalog)?;
    request.validate()?;
    Ok(Json(state.catalog.update_product(id, request).await?))
}

/// Soft-delete: the product stays referenced by past orders
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deactivated"),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    user.require(Capability::ManageCatalog)?;
    state.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run the landed cost calculation and store it as the current version
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/cost",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = SetCostRequest,
    responses(
        (status = 201, body = ProductCost),
        (status = 400, description = "Invalid exchange rate or negative input", body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 409, description = "Concurrent cost update", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn set_cost(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<SetCostRequest>,
) -> Result<(StatusCode, Json<ProductCost>), ApiError> {
    user.require(Capability::ManageCatalog)?;
    request.validate()?;
    let cost = state.catalog.set_cost(id, request).await?;
    Ok((StatusCode::CREATED, Json(cost)))
}

/// Override wholesale or retail price without recalculating
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}/cost",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateCostRequest,
    responses(
        (status = 200, body = ProductCost),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn update_cost(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCostRequest>,
) -> Result<Json<ProductCost>, ApiError> {
    user.require(Capability::ManageCatalog)?;
    request.validate()?;
    Ok(Json(state.catalog.update_cost(id, request).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/discounts/{sector_id}",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("sector_id" = i32, Path, description = "Sector ID")
    ),
    request_body = SetDiscountRequest,
    responses(
        (status = 201, body = ProductSectorDiscount),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn set_discount(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, sector_id)): Path<(i32, i32)>,
    Json(request): Json<SetDiscountRequest>,
) -> Result<(StatusCode, Json<ProductSectorDiscount>), ApiError> {
    user.require(Capability::ManageCatalog)?;
    request.validate()?;
    let discount = state
        .catalog
        .set_discount(id, sector_id, request.discount_percent)
        .await?;
    Ok((StatusCode::CREATED, Json(discount)))
}

/// End the product's discount in a sector
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}/discounts/{sector_id}",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("sector_id" = i32, Path, description = "Sector ID")
    ),
    responses(
        (status = 200, description = "The closed discount row", body = ProductSectorDiscount),
        (status = 404, description = "No open discount, product or sector", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn remove_discount(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, sector_id)): Path<(i32, i32)>,
) -> Result<Json<ProductSectorDiscount>, ApiError> {
    user.require(Capability::ManageCatalog)?;
    Ok(Json(state.catalog.remove_discount(id, sector_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/discounts",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, body = [ProductSectorDiscount]),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn list_discounts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ProductSectorDiscount>>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.list_discounts(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/price-history",
    params(("id" = i32, Path, description = "Product ID"), PriceHistoryQuery),
    responses(
        (status = 200, body = [PriceHistoryEntry]),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn price_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Query(query): Query<PriceHistoryQuery>,
) -> Result<Json<Vec<PriceHistoryEntry>>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.price_history(id, query.sector_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/sectors",
    responses((status = 200, body = [Sector])),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn list_sectors(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Sector>>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.list_sectors().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/sectors/{id}",
    params(("id" = i32, Path, description = "Sector ID")),
    responses(
        (status = 200, body = Sector),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn get_sector(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<Sector>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.get_sector(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/sectors",
    request_body = CreateSectorRequest,
    responses(
        (status = 201, body = Sector),
        (status = 409, description = "Duplicate name", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn create_sector(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateSectorRequest>,
) -> Result<(StatusCode, Json<Sector>), ApiError> {
    user.require(Capability::ManageCatalog)?;
    request.validate()?;
    let sector = state.catalog.create_sector(request).await?;
    Ok((StatusCode::CREATED, Json(sector)))
}

#[utoipa::path(
    put,
    path = "/api/v1/sectors/{id}",
    params(("id" = i32, Path, description = "Sector ID")),
    request_body = UpdateSectorRequest,
    responses(
        (status = 200, body = Sector),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn update_sector(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateSectorRequest>,
) -> Result<Json<Sector>, ApiError> {
    user.require(Capability::ManageCatalog)?;
    request.validate()?;
    Ok(Json(state.catalog.update_sector(id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sectors/{id}",
    params(("id" = i32, Path, description = "Sector ID")),
    responses(
        (status = 204, description = "Sector deactivated"),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn delete_sector(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    user.require(Capability::ManageCatalog)?;
    state.catalog.delete_sector(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses((status = 200, body = [Category])),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Category>>, ApiError> {
    user.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.list_categories().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, body = Category),
        (status = 400, body = ErrorResponse),
        (status = 409, description = "Category already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    user.require(Capability::ManageCatalog)?;
    request.validate()?;
    let category = state.catalog.create_category(request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Rename a category across every product that uses it
#[utoipa::path(
    put,
    path = "/api/v1/categories/{name}/rename",
    params(("name" = String, Path, description = "Current category name")),
    request_body = RenameCategoryRequest,
    responses(
        (status = 200, body = CategoryRenamed),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn rename_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(name): Path<String>,
    Json(request): Json<RenameCategoryRequest>,
) -> Result<Json<CategoryRenamed>, ApiError> {
    user.require(Capability::ManageCatalog)?;
    request.validate()?;
    Ok(Json(state.catalog.rename_category(&name, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{name}",
    params(("name" = String, Path, description = "Category name")),
    responses(
        (status = 200, body = CategoryDeleted),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<Json<CategoryDeleted>, ApiError> {
    user.require(Capability::ManageCatalog)?;
    Ok(Json(state.catalog.delete_category(&name).await?))
}
