//! Costing sheet models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One raw material line on a costing sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MaterialLine {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

/// How an overhead line is spread across units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// A lump sum divided by the production quantity.
    Fixed,
    /// A percentage of the materials cost per unit.
    Percentage,
    /// A flat amount added to each unit.
    PerUnit,
}

/// One overhead line on a costing sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OverheadLine {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub mode: AllocationMode,
    pub value: Decimal,
}

/// Input for a costing run: materials, overheads, and the batch size.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CostingSheetInput {
    #[validate]
    pub materials: Vec<MaterialLine>,
    #[validate]
    pub overheads: Vec<OverheadLine>,
    #[validate(range(min = 1))]
    pub production_quantity: i64,
}

/// The roll-up a costing run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub materials_cost_per_unit: Decimal,
    pub overhead_cost_per_unit: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub production_quantity: i64,
}
