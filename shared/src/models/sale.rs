//! Sales models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One sale line as the analytics pipeline consumes it.
///
/// Records arrive from the API or from imported files, so every field
/// the pipeline does not strictly require is optional. Downstream
/// stages drop what they cannot use instead of failing the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub product_id: Option<Uuid>,
    pub quantity: f64,
    pub total_price: Decimal,
    pub sold_at: Option<DateTime<Utc>>,
}

impl SaleRecord {
    pub fn new(
        product_id: Option<Uuid>,
        quantity: f64,
        total_price: Decimal,
        sold_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            product_id,
            quantity,
            total_price,
            sold_at,
        }
    }
}
