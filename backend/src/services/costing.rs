//! Costing sheet service: persisted snapshots of the unit cost roll-up

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::costing::{cost_breakdown, profit_margin};
use shared::models::{CostingSheetInput, MaterialLine, OverheadLine};

/// Costing service
#[derive(Clone)]
pub struct CostingService {
    db: PgPool,
}

/// A saved costing sheet.
///
/// The lines are stored as submitted; the computed columns come from
/// the same roll-up the browser runs, so both sides agree.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CostingSheet {
    pub id: Uuid,
    pub product_id: Uuid,
    pub production_quantity: i64,
    pub materials: Json<Vec<MaterialLine>>,
    pub overheads: Json<Vec<OverheadLine>>,
    pub materials_cost_per_unit: Decimal,
    pub overhead_cost_per_unit: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub margin: Decimal,
    pub created_at: DateTime<Utc>,
}

impl CostingService {
    /// Create a new CostingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Save a costing sheet for a product.
    ///
    /// Rolls the sheet up, snapshots it, and moves the product's cost
    /// price to the computed unit cost.
    pub async fn save(&self, product_id: Uuid, input: CostingSheetInput) -> AppResult<CostingSheet> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let selling_price: Decimal = sqlx::query_scalar(
            "SELECT selling_price FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let breakdown = cost_breakdown(&input);
        let margin = profit_margin(breakdown.unit_cost, selling_price);

        let mut tx = self.db.begin().await?;

        let sheet = sqlx::query_as::<_, CostingSheet>(
            r#"
            INSERT INTO costing_sheets
                (product_id, production_quantity, materials, overheads,
                 materials_cost_per_unit, overhead_cost_per_unit, unit_cost, total_cost, margin)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, product_id, production_quantity, materials, overheads,
                      materials_cost_per_unit, overhead_cost_per_unit, unit_cost, total_cost,
                      margin, created_at
            "#,
        )
        .bind(product_id)
        .bind(input.production_quantity)
        .bind(Json(&input.materials))
        .bind(Json(&input.overheads))
        .bind(breakdown.materials_cost_per_unit)
        .bind(breakdown.overhead_cost_per_unit)
        .bind(breakdown.unit_cost)
        .bind(breakdown.total_cost)
        .bind(margin)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE products SET cost_price = $1, updated_at = NOW() WHERE id = $2")
            .bind(breakdown.unit_cost)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%product_id, unit_cost = %breakdown.unit_cost, "costing sheet saved");

        Ok(sheet)
    }

    /// Latest costing sheet for a product
    pub async fn latest(&self, product_id: Uuid) -> AppResult<CostingSheet> {
        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;
        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        sqlx::query_as::<_, CostingSheet>(
            r#"
            SELECT id, product_id, production_quantity, materials, overheads,
                   materials_cost_per_unit, overhead_cost_per_unit, unit_cost, total_cost,
                   margin, created_at
            FROM costing_sheets
            WHERE product_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Costing sheet".to_string()))
    }
}
