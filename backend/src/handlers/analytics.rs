//! Analytics handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::analytics::{
    AnalyticsService, Dashboard, MarginReport, ProductInsights, StockStatusReport,
};
use crate::AppState;
use shared::analytics::SalesWindow;

/// Sales window selector, defaulting to all recorded history
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    #[serde(default)]
    pub window: SalesWindow,
}

/// Stock classification across the whole catalog
pub async fn stock_status(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<StockStatusReport>> {
    let service = AnalyticsService::new(state.db, &state.config.analytics);
    let report = service.stock_status(query.window).await?;
    Ok(Json(report))
}

/// Assessment, reorder advice and purchase history for one product
pub async fn product_insights(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<ProductInsights>> {
    let service = AnalyticsService::new(state.db, &state.config.analytics);
    let insights = service.product_insights(product_id, query.window).await?;
    Ok(Json(insights))
}

/// Profit margin bands across the catalog
pub async fn margins(State(state): State<AppState>) -> AppResult<Json<MarginReport>> {
    let service = AnalyticsService::new(state.db, &state.config.analytics);
    let report = service.margins().await?;
    Ok(Json(report))
}

/// Headline figures for the landing screen
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<Dashboard>> {
    let service = AnalyticsService::new(state.db, &state.config.analytics);
    let report = service.dashboard(query.window).await?;
    Ok(Json(report))
}
