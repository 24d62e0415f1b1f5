//! Sales handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::sale::{
    CreateSaleInput, ImportSummary, ListSalesFilter, Sale, SaleService, SaleWithItems,
};
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

/// Record a sale at the till
pub async fn create_sale(
    State(state): State<AppState>,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<(StatusCode, Json<SaleWithItems>)> {
    let service = SaleService::new(state.db);
    let sale = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// List sales with pagination and optional filters
pub async fn list_sales(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<ListSalesFilter>,
) -> AppResult<Json<PaginatedResponse<Sale>>> {
    let service = SaleService::new(state.db);
    let sales = service.list(&pagination, &filter).await?;
    Ok(Json(sales))
}

/// Get a sale with its line items
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleWithItems>> {
    let service = SaleService::new(state.db);
    let sale = service.get(sale_id).await?;
    Ok(Json(sale))
}

/// Import historical sales rows from an external export
pub async fn import_sales(
    State(state): State<AppState>,
    Json(rows): Json<Vec<serde_json::Value>>,
) -> AppResult<Json<ImportSummary>> {
    let service = SaleService::new(state.db);
    let summary = service.import(rows).await?;
    Ok(Json(summary))
}
