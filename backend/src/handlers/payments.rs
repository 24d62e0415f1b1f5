//! Payment handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::services::payment::{ListPaymentsFilter, Payment, PaymentService, RecordPaymentInput};
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

/// Record a payment against a sale or a purchase order
pub async fn record_payment(
    State(state): State<AppState>,
    Json(input): Json<RecordPaymentInput>,
) -> AppResult<(StatusCode, Json<Payment>)> {
    let service = PaymentService::new(state.db);
    let payment = service.record(input).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// List payments with pagination and optional filters
pub async fn list_payments(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<ListPaymentsFilter>,
) -> AppResult<Json<PaginatedResponse<Payment>>> {
    let service = PaymentService::new(state.db);
    let payments = service.list(&pagination, &filter).await?;
    Ok(Json(payments))
}
