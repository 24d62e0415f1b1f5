//! Tax rate and tax entry handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::tax::{
    CreateTaxRateInput, ListTaxEntriesFilter, RecordTaxEntryInput, TaxEntry, TaxRate, TaxService,
    UpdateTaxRateInput,
};
use crate::AppState;

/// Create a new tax rate
pub async fn create_tax_rate(
    State(state): State<AppState>,
    Json(input): Json<CreateTaxRateInput>,
) -> AppResult<(StatusCode, Json<TaxRate>)> {
    let service = TaxService::new(state.db);
    let rate = service.create_rate(input).await?;
    Ok((StatusCode::CREATED, Json(rate)))
}

/// List all tax rates
pub async fn list_tax_rates(State(state): State<AppState>) -> AppResult<Json<Vec<TaxRate>>> {
    let service = TaxService::new(state.db);
    let rates = service.list_rates().await?;
    Ok(Json(rates))
}

/// Update a tax rate
pub async fn update_tax_rate(
    State(state): State<AppState>,
    Path(rate_id): Path<Uuid>,
    Json(input): Json<UpdateTaxRateInput>,
) -> AppResult<Json<TaxRate>> {
    let service = TaxService::new(state.db);
    let rate = service.update_rate(rate_id, input).await?;
    Ok(Json(rate))
}

/// Delete a tax rate with no recorded entries
pub async fn delete_tax_rate(
    State(state): State<AppState>,
    Path(rate_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = TaxService::new(state.db);
    service.delete_rate(rate_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a collected or paid tax entry for a period
pub async fn record_tax_entry(
    State(state): State<AppState>,
    Json(input): Json<RecordTaxEntryInput>,
) -> AppResult<(StatusCode, Json<TaxEntry>)> {
    let service = TaxService::new(state.db);
    let entry = service.record_entry(input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// List tax entries with optional filters
pub async fn list_tax_entries(
    State(state): State<AppState>,
    Query(filter): Query<ListTaxEntriesFilter>,
) -> AppResult<Json<Vec<TaxEntry>>> {
    let service = TaxService::new(state.db);
    let entries = service.list_entries(&filter).await?;
    Ok(Json(entries))
}
