//! Product catalog models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a product the analytics pipeline needs.
///
/// Screens fetch full products from the backend; the classifier only
/// reads these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub quantity_in_stock: i32,
}
