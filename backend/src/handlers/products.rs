//! Product catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::product::{
    CreateProductInput, ListProductsFilter, Product, ProductService, UpdateProductInput,
};
use crate::AppState;
use shared::costing::profit_margin;
use shared::types::{PaginatedResponse, Pagination};

/// A product enriched with its derived figures
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub profit_margin: Decimal,
    pub inventory_value: Decimal,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        let margin = profit_margin(product.cost_price, product.selling_price);
        let inventory_value =
            product.cost_price * Decimal::from(product.quantity_in_stock.max(0));
        Self {
            product,
            profit_margin: margin,
            inventory_value,
        }
    }
}

/// Create a new product
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    let service = ProductService::new(state.db);
    let product = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// List products with pagination and optional filters
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<ListProductsFilter>,
) -> AppResult<Json<PaginatedResponse<ProductResponse>>> {
    let service = ProductService::new(state.db);
    let page = service.list(&pagination, &filter).await?;
    Ok(Json(PaginatedResponse {
        data: page.data.into_iter().map(Into::into).collect(),
        pagination: page.pagination,
    }))
}

/// Get a product by id
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductResponse>> {
    let service = ProductService::new(state.db);
    let product = service.get(product_id).await?;
    Ok(Json(product.into()))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductResponse>> {
    let service = ProductService::new(state.db);
    let product = service.update(product_id, input).await?;
    Ok(Json(product.into()))
}

/// Delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ProductService::new(state.db);
    service.delete(product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Products at or below their reorder level
pub async fn low_stock_products(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProductResponse>>> {
    let service = ProductService::new(state.db);
    let products = service.low_stock().await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}
