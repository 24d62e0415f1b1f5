//! Unit cost roll-up and margin math
//!
//! All money math stays in [`Decimal`]; nothing here goes through
//! floating point, so the same sheet always rolls up to the same cost.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AllocationMode, CostBreakdown, CostingSheetInput, MaterialLine, OverheadLine};

/// Materials cost baked into one unit: the sum of quantity times unit
/// cost across every line.
pub fn materials_cost_per_unit(materials: &[MaterialLine]) -> Decimal {
    materials
        .iter()
        .map(|line| line.quantity * line.unit_cost)
        .sum()
}

/// Overhead cost carried by one unit.
///
/// Fixed lines are spread over the production quantity, percentage
/// lines scale with the materials cost, per-unit lines pass through.
/// A fixed line with no production quantity to spread over contributes
/// nothing instead of dividing by zero.
pub fn overhead_cost_per_unit(
    overheads: &[OverheadLine],
    materials_per_unit: Decimal,
    production_quantity: i64,
) -> Decimal {
    overheads
        .iter()
        .map(|line| match line.mode {
            AllocationMode::Fixed => {
                if production_quantity > 0 {
                    line.value / Decimal::from(production_quantity)
                } else {
                    Decimal::ZERO
                }
            }
            AllocationMode::Percentage => materials_per_unit * line.value / Decimal::from(100),
            AllocationMode::PerUnit => line.value,
        })
        .sum()
}

/// Roll a costing sheet up into per-unit and batch totals.
pub fn cost_breakdown(input: &CostingSheetInput) -> CostBreakdown {
    let materials_cost = materials_cost_per_unit(&input.materials);
    let overhead_cost =
        overhead_cost_per_unit(&input.overheads, materials_cost, input.production_quantity);
    let unit_cost = materials_cost + overhead_cost;
    CostBreakdown {
        materials_cost_per_unit: materials_cost,
        overhead_cost_per_unit: overhead_cost,
        unit_cost,
        total_cost: unit_cost * Decimal::from(input.production_quantity),
        production_quantity: input.production_quantity,
    }
}

/// Profit margin as a percentage of the selling price, rounded to two
/// decimals.
///
/// Returns zero when the cost is unknown (zero) or the price is not
/// positive, so a half-filled product never reports a fake margin.
pub fn profit_margin(unit_cost: Decimal, selling_price: Decimal) -> Decimal {
    if unit_cost == Decimal::ZERO || selling_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((selling_price - unit_cost) / selling_price * Decimal::from(100)).round_dp(2)
}

/// Weighted average purchase price across received lots.
///
/// Each lot is a `(quantity, unit_price)` pair. Lots with nothing in
/// them are ignored; no received quantity at all averages to zero.
pub fn weighted_average_cost<I>(lots: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    let mut total_quantity = Decimal::ZERO;
    let mut total_value = Decimal::ZERO;
    for (quantity, unit_price) in lots {
        if quantity <= Decimal::ZERO {
            continue;
        }
        total_quantity += quantity;
        total_value += quantity * unit_price;
    }
    if total_quantity == Decimal::ZERO {
        return Decimal::ZERO;
    }
    (total_value / total_quantity).round_dp(4)
}

/// Straight-line depreciation position of a fixed asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationSchedule {
    pub monthly_depreciation: Decimal,
    pub accumulated_depreciation: Decimal,
    pub book_value: Decimal,
}

/// Depreciate an asset on a straight line over its useful life.
///
/// Accumulated depreciation grows by whole elapsed months and is
/// capped at the depreciable base, so the book value never drops below
/// salvage. An asset with no useful life or nothing to depreciate
/// keeps its full acquisition cost on the books.
pub fn straight_line_depreciation(
    acquisition_cost: Decimal,
    salvage_value: Decimal,
    useful_life_months: i32,
    elapsed_months: i64,
) -> DepreciationSchedule {
    let depreciable = (acquisition_cost - salvage_value).max(Decimal::ZERO);
    if useful_life_months <= 0 || depreciable == Decimal::ZERO {
        return DepreciationSchedule {
            monthly_depreciation: Decimal::ZERO,
            accumulated_depreciation: Decimal::ZERO,
            book_value: acquisition_cost,
        };
    }

    let monthly = (depreciable / Decimal::from(useful_life_months)).round_dp(2);
    let accumulated = (monthly * Decimal::from(elapsed_months.max(0))).min(depreciable);

    DepreciationSchedule {
        monthly_depreciation: monthly,
        accumulated_depreciation: accumulated,
        book_value: acquisition_cost - accumulated,
    }
}

/// Whole months elapsed from one date to another, never negative.
///
/// A month only counts once its day of the month has passed, so an
/// asset acquired on the 15th starts depreciating on the next 15th.
pub fn elapsed_months(from: NaiveDate, to: NaiveDate) -> i64 {
    if to <= from {
        return 0;
    }
    let mut months = i64::from(to.year() - from.year()) * 12
        + i64::from(to.month() as i32 - from.month() as i32);
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0)
}
