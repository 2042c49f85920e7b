use crate::error::ApiError;

/// Error types for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Sector not found: {0}")]
    SectorNotFound(i32),

    #[error("No active cost for product {0}")]
    CostNotFound(i32),

    #[error("No active discount for product {product_id} in sector {sector_id}")]
    DiscountNotFound { product_id: i32, sector_id: i32 },

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Category already exists: {0}")]
    CategoryExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::DatabaseError(e) => ApiError::from(e),
            CatalogError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CatalogError::SectorNotFound(id) => ApiError::not_found("Sector", id),
            CatalogError::CostNotFound(product_id) => ApiError::CostNotFound { product_id },
            CatalogError::DiscountNotFound {
                product_id,
                sector_id,
            } => ApiError::DiscountNotFound {
                product_id,
                sector_id,
            },
            CatalogError::CategoryNotFound(name) => ApiError::not_found("Category", name),
            CatalogError::CategoryExists(name) => ApiError::Conflict {
                message: format!("Category {} already exists", name),
            },
            CatalogError::InvalidInput(msg) => ApiError::InvalidInput(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(CatalogError::ProductNotFound(1)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CatalogError::CostNotFound(1)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CatalogError::InvalidInput("exchange rate".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CatalogError::DiscountNotFound {
                product_id: 1,
                sector_id: 2
            })
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CatalogError::CategoryExists("tea".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(CatalogError::CategoryNotFound("tea".into())).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
