//! Purchase order handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::purchase_order::{
    CreatePurchaseOrderInput, ListPurchaseOrdersFilter, PurchaseDetail, PurchaseDetailInput,
    PurchaseOrder, PurchaseOrderService, PurchaseOrderWithDetails,
};
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

/// Create a purchase order with its initial lines
pub async fn create_purchase_order(
    State(state): State<AppState>,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> AppResult<(StatusCode, Json<PurchaseOrderWithDetails>)> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List purchase orders with pagination and optional filters
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<ListPurchaseOrdersFilter>,
) -> AppResult<Json<PaginatedResponse<PurchaseOrder>>> {
    let service = PurchaseOrderService::new(state.db);
    let orders = service.list(&pagination, &filter).await?;
    Ok(Json(orders))
}

/// Get a purchase order with its lines
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrderWithDetails>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.get(order_id).await?;
    Ok(Json(order))
}

/// Add a line to a pending purchase order
pub async fn add_purchase_detail(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<PurchaseDetailInput>,
) -> AppResult<(StatusCode, Json<PurchaseDetail>)> {
    let service = PurchaseOrderService::new(state.db);
    let detail = service.add_detail(order_id, input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// List the lines of a purchase order
pub async fn list_purchase_details(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Vec<PurchaseDetail>>> {
    let service = PurchaseOrderService::new(state.db);
    let details = service.get_details(order_id).await?;
    Ok(Json(details))
}

/// Receive a pending purchase order into stock
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrderWithDetails>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.receive(order_id).await?;
    Ok(Json(order))
}

/// Cancel a pending purchase order
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.cancel(order_id).await?;
    Ok(Json(order))
}
