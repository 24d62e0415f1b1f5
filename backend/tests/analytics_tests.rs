//! Tests for the sales analytics pipeline
//!
//! Covers window filtering, per-product aggregation, the stock
//! classification ladder, reorder insights and margin banding.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::analytics::{
    aggregate_sales, assess_margin, assess_product, classify_stock, coverage_days,
    filter_by_window, margin_stats, reorder_advice, ClassifierThresholds, InsightParams,
    MarginBand, MarginStats, SalesWindow, StatusPriority, StockStatus,
};
use shared::{ProductSnapshot, SaleRecord};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// A fixed "now" so the window math never depends on wall time
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn record(product_id: Option<Uuid>, days_ago: i64, quantity: f64, total: &str) -> SaleRecord {
    SaleRecord {
        product_id,
        quantity,
        total_price: dec(total),
        sold_at: Some(now() - Duration::days(days_ago)),
    }
}

fn snapshot(id: Uuid, stock: i32) -> ProductSnapshot {
    ProductSnapshot {
        id,
        name: "Espresso beans".to_string(),
        cost_price: dec("5.00"),
        selling_price: dec("9.00"),
        quantity_in_stock: stock,
    }
}

// =============================================================================
// Window filtering
// =============================================================================

mod window_filtering {
    use super::*;

    #[test]
    fn month_window_includes_record_exactly_thirty_days_old() {
        let id = Some(Uuid::from_u128(1));
        let records = vec![record(id, 30, 1.0, "10.00")];

        let kept = filter_by_window(&records, SalesWindow::Month, now());
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn week_window_drops_older_records() {
        let id = Some(Uuid::from_u128(1));
        let records = vec![
            record(id, 3, 1.0, "10.00"),
            record(id, 8, 1.0, "10.00"),
        ];

        let kept = filter_by_window(&records, SalesWindow::Week, now());
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn future_records_fall_outside_every_window() {
        let id = Some(Uuid::from_u128(1));
        let records = vec![record(id, -1, 1.0, "10.00")];

        let kept = filter_by_window(&records, SalesWindow::Year, now());
        assert!(kept.is_empty());
    }

    #[test]
    fn undated_records_survive_only_the_unbounded_window() {
        let records = vec![SaleRecord {
            product_id: Some(Uuid::from_u128(1)),
            quantity: 2.0,
            total_price: dec("20.00"),
            sold_at: None,
        }];

        assert!(filter_by_window(&records, SalesWindow::Month, now()).is_empty());
        assert_eq!(filter_by_window(&records, SalesWindow::All, now()).len(), 1);
    }
}

// =============================================================================
// Aggregation
// =============================================================================

mod aggregation {
    use super::*;

    #[test]
    fn totals_accumulate_per_product() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let records = vec![
            record(Some(a), 1, 2.0, "18.00"),
            record(Some(a), 5, 3.0, "27.00"),
            record(Some(b), 2, 1.0, "4.50"),
        ];

        let totals = aggregate_sales(&records);
        assert_eq!(totals.len(), 2);

        let a_totals = &totals[&a];
        assert!((a_totals.total_sold - 5.0).abs() < 1e-9);
        assert_eq!(a_totals.total_revenue, dec("45.00"));
        assert_eq!(a_totals.sales_count, 2);
    }

    #[test]
    fn records_without_a_product_are_skipped() {
        let a = Uuid::from_u128(1);
        let records = vec![
            record(Some(a), 1, 2.0, "18.00"),
            record(None, 1, 99.0, "500.00"),
        ];

        let totals = aggregate_sales(&records);
        assert_eq!(totals.len(), 1);
        assert!((totals[&a].total_sold - 2.0).abs() < 1e-9);
    }

    #[test]
    fn last_sale_keeps_the_newest_timestamp() {
        let a = Uuid::from_u128(1);
        let records = vec![
            record(Some(a), 10, 1.0, "9.00"),
            record(Some(a), 2, 1.0, "9.00"),
            record(Some(a), 6, 1.0, "9.00"),
        ];

        let totals = aggregate_sales(&records);
        assert_eq!(totals[&a].last_sale_at, Some(now() - Duration::days(2)));
    }
}

// =============================================================================
// Stock classification ladder
// =============================================================================

mod classification {
    use super::*;

    fn classify(stock: i32, velocity: f64) -> (StockStatus, StatusPriority) {
        classify_stock(stock, velocity, &ClassifierThresholds::default())
    }

    #[test]
    fn empty_shelf_is_out_regardless_of_velocity() {
        assert_eq!(classify(0, 0.0).0, StockStatus::Out);
        assert_eq!(classify(0, 25.0).0, StockStatus::Out);
        assert_eq!(classify(-3, 1.0).0, StockStatus::Out);
        assert_eq!(classify(0, 25.0).1, StatusPriority::Critical);
    }

    #[test]
    fn coverage_below_seven_days_is_critical() {
        // 6 days of coverage
        assert_eq!(classify(6, 1.0), (StockStatus::CriticalLow, StatusPriority::Critical));
    }

    #[test]
    fn coverage_of_exactly_seven_days_is_low_not_critical() {
        assert_eq!(classify(7, 1.0), (StockStatus::Low, StatusPriority::High));
    }

    #[test]
    fn coverage_of_exactly_fourteen_days_is_still_low() {
        assert_eq!(classify(14, 1.0).0, StockStatus::Low);
        assert_eq!(classify(15, 1.0).0, StockStatus::Normal);
    }

    #[test]
    fn coverage_of_exactly_thirty_days_is_high() {
        assert_eq!(classify(29, 1.0).0, StockStatus::Normal);
        assert_eq!(classify(30, 1.0).0, StockStatus::High);
    }

    #[test]
    fn coverage_of_exactly_ninety_days_is_high_not_overstock() {
        assert_eq!(classify(90, 1.0).0, StockStatus::High);
        assert_eq!(classify(91, 1.0).0, StockStatus::Overstock);
    }

    #[test]
    fn dormant_products_classify_on_raw_stock() {
        assert_eq!(classify(20, 0.0), (StockStatus::Low, StatusPriority::High));
        assert_eq!(classify(21, 0.0).0, StockStatus::Normal);
        assert_eq!(classify(200, 0.0).0, StockStatus::Normal);
        assert_eq!(classify(201, 0.0), (StockStatus::High, StatusPriority::Medium));
    }

    #[test]
    fn slow_mover_lands_in_the_low_band() {
        // 20 units over a 30-day window on a shelf of 5: velocity
        // 0.667/day, roughly 7.5 days of coverage.
        let id = Uuid::from_u128(7);
        let product = snapshot(id, 5);
        let records = vec![record(Some(id), 3, 20.0, "180.00")];

        let totals = aggregate_sales(&records);
        let assessment = assess_product(
            &product,
            totals.get(&id),
            SalesWindow::Month,
            &ClassifierThresholds::default(),
        );

        assert!((assessment.daily_velocity - 20.0 / 30.0).abs() < 1e-9);
        let coverage = assessment.coverage_days.unwrap();
        assert!((coverage - 7.5).abs() < 1e-9);
        assert_eq!(assessment.status, StockStatus::Low);
        assert_eq!(assessment.priority, StatusPriority::High);
    }

    #[test]
    fn product_with_no_sales_in_window_assesses_at_zero_velocity() {
        let id = Uuid::from_u128(8);
        let product = snapshot(id, 50);

        let assessment = assess_product(
            &product,
            None,
            SalesWindow::Month,
            &ClassifierThresholds::default(),
        );

        assert_eq!(assessment.daily_velocity, 0.0);
        assert_eq!(assessment.coverage_days, None);
        assert_eq!(assessment.status, StockStatus::Normal);
    }
}

// =============================================================================
// Reorder insights
// =============================================================================

mod reorder {
    use super::*;

    #[test]
    fn zero_velocity_falls_back_to_half_the_shelf() {
        let advice = reorder_advice(30, 0.0, dec("10.00"), &InsightParams::default());
        assert_eq!(advice.economic_order_quantity, 15.0);
        assert_eq!(advice.reorder_point, 0);
    }

    #[test]
    fn fallback_order_size_caps_at_fifty() {
        let advice = reorder_advice(400, 0.0, dec("10.00"), &InsightParams::default());
        assert_eq!(advice.economic_order_quantity, 50.0);
    }

    #[test]
    fn zero_cost_also_avoids_the_eoq_division() {
        let advice = reorder_advice(40, 3.0, Decimal::ZERO, &InsightParams::default());
        assert_eq!(advice.economic_order_quantity, 20.0);
    }

    #[test]
    fn reorder_point_covers_lead_time_demand_with_buffer() {
        // 2 units/day over a 7-day lead time with a 1.5x buffer
        let advice = reorder_advice(100, 2.0, dec("10.00"), &InsightParams::default());
        assert_eq!(advice.reorder_point, 21);
    }

    #[test]
    fn eoq_balances_order_and_holding_costs() {
        // 5 units/day at a 10.00 unit cost with the default order cost
        // and holding rate: sqrt(2 * 50 * 5 / (10 * 0.20 / 365))
        let advice = reorder_advice(100, 5.0, dec("10.00"), &InsightParams::default());
        assert_eq!(advice.economic_order_quantity, 302.0);
        assert!((advice.coverage_days.unwrap() - 20.0).abs() < 1e-9);
    }
}

// =============================================================================
// Margin banding
// =============================================================================

mod margins {
    use super::*;

    #[test]
    fn stats_require_at_least_one_margin() {
        assert_eq!(margin_stats(&[]), None);
    }

    #[test]
    fn stats_use_the_population_deviation() {
        let stats = margin_stats(&[10.0, 20.0, 30.0]).unwrap();
        assert!((stats.mean - 20.0).abs() < 1e-9);
        assert!((stats.std_dev - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn bands_split_around_one_deviation() {
        let stats = MarginStats {
            mean: 30.0,
            std_dev: 5.0,
        };
        assert_eq!(assess_margin(24.0, &stats), MarginBand::Low);
        assert_eq!(assess_margin(30.0, &stats), MarginBand::Average);
        assert_eq!(assess_margin(36.0, &stats), MarginBand::Excellent);
    }

    #[test]
    fn margins_well_under_the_mean_are_low_even_within_a_wide_deviation() {
        let stats = MarginStats {
            mean: 40.0,
            std_dev: 30.0,
        };
        // 25 is within one deviation but under three quarters of the mean
        assert_eq!(assess_margin(25.0, &stats), MarginBand::Low);
    }
}

// =============================================================================
// Property tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Aggregation accounts for every attributed unit and nothing else
    #[test]
    fn prop_aggregation_preserves_attributed_quantities(
        rows in prop::collection::vec((any::<bool>(), 0.0f64..1000.0), 0..40)
    ) {
        let id = Uuid::from_u128(42);
        let records: Vec<SaleRecord> = rows
            .iter()
            .map(|(attributed, quantity)| SaleRecord {
                product_id: attributed.then_some(id),
                quantity: *quantity,
                total_price: Decimal::ONE,
                sold_at: None,
            })
            .collect();

        let expected: f64 = rows
            .iter()
            .filter(|(attributed, _)| *attributed)
            .map(|(_, quantity)| quantity)
            .sum();

        let totals = aggregate_sales(&records);
        let total_sold = totals.get(&id).map(|t| t.total_sold).unwrap_or(0.0);
        prop_assert!((total_sold - expected).abs() < 1e-6);
    }

    /// Every stock position lands in exactly one bucket, and only an
    /// empty shelf reads as out
    #[test]
    fn prop_classifier_is_total_and_out_means_empty(
        stock in -100i32..2000,
        velocity in 0.0f64..50.0
    ) {
        let (status, _) = classify_stock(stock, velocity, &ClassifierThresholds::default());
        prop_assert_eq!(status == StockStatus::Out, stock <= 0);
    }

    /// Coverage days is stock over velocity whenever something sells
    #[test]
    fn prop_coverage_days_matches_the_ratio(
        stock in 1i32..5000,
        velocity in 0.01f64..100.0
    ) {
        let days = coverage_days(stock, velocity).unwrap();
        prop_assert!((days - stock as f64 / velocity).abs() < 1e-6);
    }

    /// The order size suggestion is always finite and non-negative
    #[test]
    fn prop_order_suggestion_is_usable(
        stock in 0i32..10_000,
        velocity in 0.0f64..100.0,
        unit_cost in 0.0f64..500.0
    ) {
        let cost = Decimal::try_from(unit_cost).unwrap_or(Decimal::ZERO);
        let advice = reorder_advice(stock, velocity, cost, &InsightParams::default());
        prop_assert!(advice.economic_order_quantity.is_finite());
        prop_assert!(advice.economic_order_quantity >= 0.0);
    }

    /// Excellent margins sit above the mean, low margins below it
    #[test]
    fn prop_margin_bands_respect_the_mean(
        margin in 0.0f64..100.0,
        mean in 1.0f64..100.0,
        std_dev in 0.0f64..50.0
    ) {
        let stats = MarginStats { mean, std_dev };
        match assess_margin(margin, &stats) {
            MarginBand::Excellent => prop_assert!(margin > mean),
            MarginBand::Low => prop_assert!(margin < mean),
            MarginBand::Average => {}
        }
    }
}
