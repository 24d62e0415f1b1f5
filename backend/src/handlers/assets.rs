//! Fixed asset handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::asset::{
    AssetService, AssetWithDepreciation, CreateAssetInput, DepreciationReport, FixedAsset,
    UpdateAssetInput,
};
use crate::AppState;

/// Valuation date for depreciation figures, defaulting to today
#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

impl AsOfQuery {
    fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// Register a fixed asset
pub async fn create_asset(
    State(state): State<AppState>,
    Json(input): Json<CreateAssetInput>,
) -> AppResult<(StatusCode, Json<FixedAsset>)> {
    let service = AssetService::new(state.db);
    let asset = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// List fixed assets with depreciation as of a date
pub async fn list_assets(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Vec<AssetWithDepreciation>>> {
    let service = AssetService::new(state.db);
    let assets = service.list(query.as_of()).await?;
    Ok(Json(assets))
}

/// Get a fixed asset with depreciation as of a date
pub async fn get_asset(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<AssetWithDepreciation>> {
    let service = AssetService::new(state.db);
    let asset = service.get(asset_id, query.as_of()).await?;
    Ok(Json(asset))
}

/// Update a fixed asset
pub async fn update_asset(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
    Json(input): Json<UpdateAssetInput>,
) -> AppResult<Json<FixedAsset>> {
    let service = AssetService::new(state.db);
    let asset = service.update(asset_id, input).await?;
    Ok(Json(asset))
}

/// Delete a fixed asset
pub async fn delete_asset(
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = AssetService::new(state.db);
    service.delete(asset_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Depreciation schedule for every asset as of a date
pub async fn depreciation_report(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<DepreciationReport>> {
    let service = AssetService::new(state.db);
    let report = service.depreciation_report(query.as_of()).await?;
    Ok(Json(report))
}
