//! Product costing sheet handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::costing::{CostingService, CostingSheet};
use crate::AppState;
use shared::models::CostingSheetInput;

/// Save a costing sheet for a product and refresh its cost price
pub async fn save_product_costing(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<CostingSheetInput>,
) -> AppResult<(StatusCode, Json<CostingSheet>)> {
    let service = CostingService::new(state.db);
    let sheet = service.save(product_id, input).await?;
    Ok((StatusCode::CREATED, Json(sheet)))
}

/// Latest saved costing sheet for a product
pub async fn get_product_costing(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<CostingSheet>> {
    let service = CostingService::new(state.db);
    let sheet = service.latest(product_id).await?;
    Ok(Json(sheet))
}
