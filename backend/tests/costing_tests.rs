//! Tests for the costing math
//!
//! Covers the unit cost roll-up, purchase price averaging and
//! straight-line depreciation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use shared::costing::{
    cost_breakdown, elapsed_months, materials_cost_per_unit, overhead_cost_per_unit,
    profit_margin, straight_line_depreciation, weighted_average_cost,
};
use shared::models::{AllocationMode, CostingSheetInput, MaterialLine, OverheadLine};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn material(quantity: &str, unit_cost: &str) -> MaterialLine {
    MaterialLine {
        name: "Flour".to_string(),
        quantity: dec(quantity),
        unit_cost: dec(unit_cost),
    }
}

fn overhead(mode: AllocationMode, value: &str) -> OverheadLine {
    OverheadLine {
        name: "Utilities".to_string(),
        mode,
        value: dec(value),
    }
}

// =============================================================================
// Unit cost roll-up
// =============================================================================

mod roll_up {
    use super::*;

    #[test]
    fn materials_only_sheet_rolls_up_to_the_materials_cost() {
        let input = CostingSheetInput {
            materials: vec![material("2", "3.00")],
            overheads: vec![],
            production_quantity: 1,
        };

        let breakdown = cost_breakdown(&input);
        assert_eq!(breakdown.materials_cost_per_unit, dec("6.00"));
        assert_eq!(breakdown.overhead_cost_per_unit, Decimal::ZERO);
        assert_eq!(breakdown.unit_cost, dec("6.00"));
        assert_eq!(breakdown.total_cost, dec("6.00"));
    }

    #[test]
    fn percentage_overhead_scales_with_the_materials_cost() {
        let input = CostingSheetInput {
            materials: vec![material("2", "3.00")],
            overheads: vec![overhead(AllocationMode::Percentage, "10")],
            production_quantity: 1,
        };

        let breakdown = cost_breakdown(&input);
        assert_eq!(breakdown.materials_cost_per_unit, dec("6.00"));
        assert_eq!(breakdown.overhead_cost_per_unit, dec("0.600"));
        assert_eq!(breakdown.unit_cost, dec("6.600"));
    }

    #[test]
    fn fixed_overhead_spreads_across_the_batch() {
        let input = CostingSheetInput {
            materials: vec![material("1", "2.00")],
            overheads: vec![overhead(AllocationMode::Fixed, "100.00")],
            production_quantity: 10,
        };

        let breakdown = cost_breakdown(&input);
        assert_eq!(breakdown.overhead_cost_per_unit, dec("10.00"));
        assert_eq!(breakdown.unit_cost, dec("12.00"));
        assert_eq!(breakdown.total_cost, dec("120.00"));
    }

    #[test]
    fn per_unit_overhead_passes_straight_through() {
        let overheads = vec![overhead(AllocationMode::PerUnit, "1.50")];
        assert_eq!(overhead_cost_per_unit(&overheads, dec("4.00"), 25), dec("1.50"));
    }

    #[test]
    fn empty_sheet_costs_nothing() {
        assert_eq!(materials_cost_per_unit(&[]), Decimal::ZERO);
    }
}

// =============================================================================
// Profit margin
// =============================================================================

mod margin {
    use super::*;

    #[test]
    fn unknown_cost_reports_a_zero_margin() {
        assert_eq!(profit_margin(Decimal::ZERO, dec("10.00")), Decimal::ZERO);
    }

    #[test]
    fn unpriced_product_reports_a_zero_margin() {
        assert_eq!(profit_margin(dec("4.00"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn margin_is_the_markup_share_of_the_price() {
        assert_eq!(profit_margin(dec("6.00"), dec("10.00")), dec("40.00"));
    }

    #[test]
    fn selling_below_cost_reports_a_negative_margin() {
        assert_eq!(profit_margin(dec("12.00"), dec("10.00")), dec("-20.00"));
    }
}

// =============================================================================
// Purchase price averaging
// =============================================================================

mod purchase_average {
    use super::*;

    #[test]
    fn lots_blend_by_quantity() {
        let average = weighted_average_cost([
            (dec("10"), dec("2.00")),
            (dec("10"), dec("4.00")),
        ]);
        assert_eq!(average, dec("3.0000"));
    }

    #[test]
    fn uneven_lots_pull_the_average_toward_the_bigger_one() {
        let average = weighted_average_cost([
            (dec("3"), dec("1.00")),
            (dec("1"), dec("2.00")),
        ]);
        assert_eq!(average, dec("1.2500"));
    }

    #[test]
    fn no_received_quantity_averages_to_zero() {
        let no_lots: [(Decimal, Decimal); 0] = [];
        assert_eq!(weighted_average_cost(no_lots), Decimal::ZERO);
        assert_eq!(
            weighted_average_cost([(Decimal::ZERO, dec("5.00"))]),
            Decimal::ZERO
        );
    }
}

// =============================================================================
// Depreciation
// =============================================================================

mod depreciation {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn straight_line_spreads_the_depreciable_base_evenly() {
        let schedule = straight_line_depreciation(dec("1000.00"), dec("100.00"), 36, 12);
        assert_eq!(schedule.monthly_depreciation, dec("25.00"));
        assert_eq!(schedule.accumulated_depreciation, dec("300.00"));
        assert_eq!(schedule.book_value, dec("700.00"));
    }

    #[test]
    fn book_value_never_falls_below_salvage() {
        let schedule = straight_line_depreciation(dec("1000.00"), dec("100.00"), 36, 48);
        assert_eq!(schedule.accumulated_depreciation, dec("900.00"));
        assert_eq!(schedule.book_value, dec("100.00"));
    }

    #[test]
    fn degenerate_inputs_do_not_depreciate() {
        let zero_life = straight_line_depreciation(dec("1000.00"), dec("100.00"), 0, 12);
        assert_eq!(zero_life.accumulated_depreciation, Decimal::ZERO);
        assert_eq!(zero_life.book_value, dec("1000.00"));

        let nothing_owned = straight_line_depreciation(dec("500.00"), dec("500.00"), 24, 12);
        assert_eq!(nothing_owned.monthly_depreciation, Decimal::ZERO);
    }

    #[test]
    fn months_elapse_only_once_the_day_of_month_passes() {
        let acquired = date(2025, 1, 15);
        assert_eq!(elapsed_months(acquired, date(2025, 2, 14)), 0);
        assert_eq!(elapsed_months(acquired, date(2025, 2, 15)), 1);
        assert_eq!(elapsed_months(acquired, date(2026, 1, 15)), 12);
        assert_eq!(elapsed_months(acquired, date(2024, 12, 1)), 0);
    }
}

// =============================================================================
// Property tests
// =============================================================================

fn money() -> impl Strategy<Value = Decimal> {
    (0i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Unit cost is always materials plus overhead, and the batch
    /// total is the unit cost times the batch size
    #[test]
    fn prop_breakdown_is_additive(
        lines in prop::collection::vec((money(), money()), 0..8),
        per_unit in money(),
        quantity in 1i64..500
    ) {
        let input = CostingSheetInput {
            materials: lines
                .into_iter()
                .map(|(q, c)| MaterialLine {
                    name: "Line".to_string(),
                    quantity: q,
                    unit_cost: c,
                })
                .collect(),
            overheads: vec![OverheadLine {
                name: "Packing".to_string(),
                mode: AllocationMode::PerUnit,
                value: per_unit,
            }],
            production_quantity: quantity,
        };

        let breakdown = cost_breakdown(&input);
        prop_assert_eq!(
            breakdown.unit_cost,
            breakdown.materials_cost_per_unit + breakdown.overhead_cost_per_unit
        );
        prop_assert_eq!(
            breakdown.total_cost,
            breakdown.unit_cost * Decimal::from(quantity)
        );
    }

    /// A blended purchase price never leaves the range of its lot prices
    #[test]
    fn prop_weighted_average_stays_within_the_lot_prices(
        lots in prop::collection::vec((1i64..1000, money()), 1..10)
    ) {
        let lots: Vec<(Decimal, Decimal)> = lots
            .into_iter()
            .map(|(quantity, price)| (Decimal::from(quantity), price))
            .collect();

        let min = lots.iter().map(|(_, p)| *p).min().unwrap();
        let max = lots.iter().map(|(_, p)| *p).max().unwrap();
        let average = weighted_average_cost(lots);

        prop_assert!(average >= min);
        prop_assert!(average <= max);
    }

    /// Accumulated depreciation grows with time and never exceeds the
    /// depreciable base
    #[test]
    fn prop_depreciation_is_monotonic_and_capped(
        salvage in money(),
        extra in money(),
        life in 1i32..240,
        months in 0i64..300
    ) {
        let cost = salvage + extra;
        let earlier = straight_line_depreciation(cost, salvage, life, months);
        let later = straight_line_depreciation(cost, salvage, life, months + 1);

        prop_assert!(later.accumulated_depreciation >= earlier.accumulated_depreciation);
        prop_assert!(earlier.accumulated_depreciation <= cost - salvage);
        prop_assert!(earlier.book_value >= salvage);
    }
}
