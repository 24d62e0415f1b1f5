//! Financial report handlers
//!
//! Every report renders as JSON by default and as CSV when the request
//! asks for `format=csv`.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::reporting::{ReportRange, ReportingService};
use crate::AppState;

/// Query parameters for period reports
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub format: Option<String>,
}

impl ReportQuery {
    fn range(&self) -> ReportRange {
        ReportRange {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Query parameters for point-in-time reports
#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    pub as_of: Option<NaiveDate>,
    pub format: Option<String>,
}

impl SnapshotQuery {
    fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }
}

fn csv_response(csv: String, filename: &'static str) -> axum::response::Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    )
        .into_response()
}

/// Income statement for a period
pub async fn income_statement(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db);
    let statement = service.income_statement(&query.range()).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(std::slice::from_ref(&statement))?;
        Ok(csv_response(
            csv,
            "attachment; filename=\"income_statement.csv\"",
        ))
    } else {
        Ok(Json(statement).into_response())
    }
}

/// Trial balance as of a date
pub async fn trial_balance(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db);
    let balance = service.trial_balance(query.as_of()).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&balance.rows)?;
        Ok(csv_response(
            csv,
            "attachment; filename=\"trial_balance.csv\"",
        ))
    } else {
        Ok(Json(balance).into_response())
    }
}

/// Balance sheet as of a date
pub async fn balance_sheet(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db);
    let sheet = service.balance_sheet(query.as_of()).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(std::slice::from_ref(&sheet))?;
        Ok(csv_response(
            csv,
            "attachment; filename=\"balance_sheet.csv\"",
        ))
    } else {
        Ok(Json(sheet).into_response())
    }
}

/// General ledger for a period
pub async fn general_ledger(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db);
    let ledger = service.general_ledger(&query.range()).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&ledger.entries)?;
        Ok(csv_response(
            csv,
            "attachment; filename=\"general_ledger.csv\"",
        ))
    } else {
        Ok(Json(ledger).into_response())
    }
}
