//! Sales analytics pipeline: window filter, aggregation, stock
//! classification, and reorder insights
//!
//! Every function here is pure. The caller supplies `now`, so the same
//! code runs on the backend and in the browser via WASM and is
//! reproducible in tests.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::{ProductSnapshot, SaleRecord};

// ============================================================================
// Time Windows
// ============================================================================

/// A trailing sales window ending at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesWindow {
    Week,
    Month,
    Quarter,
    Year,
    All,
}

impl SalesWindow {
    /// Parse a window name leniently. Anything unrecognized falls back
    /// to [`SalesWindow::All`] rather than failing the request.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "week" => SalesWindow::Week,
            "month" => SalesWindow::Month,
            "quarter" => SalesWindow::Quarter,
            "year" => SalesWindow::Year,
            _ => SalesWindow::All,
        }
    }

    /// Length in days, `None` for the unbounded window.
    pub fn days(&self) -> Option<i64> {
        match self {
            SalesWindow::Week => Some(7),
            SalesWindow::Month => Some(30),
            SalesWindow::Quarter => Some(90),
            SalesWindow::Year => Some(365),
            SalesWindow::All => None,
        }
    }

    /// Divisor used when turning a window total into a daily rate.
    /// The unbounded window is read as a month so velocities stay
    /// comparable across windows.
    pub fn velocity_divisor_days(&self) -> f64 {
        self.days().unwrap_or(30) as f64
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SalesWindow::Week => "week",
            SalesWindow::Month => "month",
            SalesWindow::Quarter => "quarter",
            SalesWindow::Year => "year",
            SalesWindow::All => "all",
        }
    }
}

impl Default for SalesWindow {
    fn default() -> Self {
        SalesWindow::All
    }
}

impl<'de> Deserialize<'de> for SalesWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(SalesWindow::parse(&raw))
    }
}

/// Keep the records whose timestamp falls inside the window.
///
/// Both bounds are inclusive. Records without a timestamp are dropped
/// by bounded windows and kept by [`SalesWindow::All`].
pub fn filter_by_window(
    records: &[SaleRecord],
    window: SalesWindow,
    now: DateTime<Utc>,
) -> Vec<SaleRecord> {
    let days = match window.days() {
        Some(days) => days,
        None => return records.to_vec(),
    };
    let cutoff = now - Duration::days(days);
    records
        .iter()
        .filter(|record| match record.sold_at {
            Some(sold_at) => sold_at >= cutoff && sold_at <= now,
            None => false,
        })
        .cloned()
        .collect()
}

// ============================================================================
// Aggregation
// ============================================================================

/// Per-product totals over one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSalesTotals {
    pub total_sold: f64,
    pub total_revenue: Decimal,
    pub sales_count: u64,
    pub last_sale_at: Option<DateTime<Utc>>,
}

impl ProductSalesTotals {
    /// Units sold per day over the window.
    pub fn daily_velocity(&self, window: SalesWindow) -> f64 {
        self.total_sold / window.velocity_divisor_days()
    }
}

/// Fold sale records into per-product totals.
///
/// Records without a product id cannot be attributed and are skipped.
pub fn aggregate_sales(records: &[SaleRecord]) -> HashMap<Uuid, ProductSalesTotals> {
    let mut totals: HashMap<Uuid, ProductSalesTotals> = HashMap::new();
    for record in records {
        let product_id = match record.product_id {
            Some(id) => id,
            None => continue,
        };
        let entry = totals.entry(product_id).or_default();
        entry.total_sold += record.quantity;
        entry.total_revenue += record.total_price;
        entry.sales_count += 1;
        entry.last_sale_at = match (entry.last_sale_at, record.sold_at) {
            (Some(current), Some(sold_at)) => Some(current.max(sold_at)),
            (current, sold_at) => current.or(sold_at),
        };
    }
    totals
}

// ============================================================================
// Stock Classification
// ============================================================================

/// Stock level classification, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Out,
    CriticalLow,
    Low,
    Normal,
    High,
    Overstock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Out => "out",
            StockStatus::CriticalLow => "critical_low",
            StockStatus::Low => "low",
            StockStatus::Normal => "normal",
            StockStatus::High => "high",
            StockStatus::Overstock => "overstock",
        }
    }
}

/// How urgently a stock status needs attention. Ordered so that
/// sorting ascending puts the most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl StatusPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusPriority::Critical => "critical",
            StatusPriority::High => "high",
            StatusPriority::Medium => "medium",
            StatusPriority::Low => "low",
        }
    }
}

/// Tunable boundaries for the stock classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Below this many days of coverage, stock is critically low.
    pub critical_coverage_days: f64,
    /// At or below this many days of coverage, stock is low.
    pub low_coverage_days: f64,
    /// At or above this many days of coverage, stock is on the high side.
    pub high_coverage_days: f64,
    /// Above this many days of coverage, stock is overstocked.
    pub overstock_coverage_days: f64,
    /// With no sales at all, stock at or below this still counts as low.
    pub stagnant_low_stock: i32,
    /// With no sales at all, stock above this counts as piled high.
    pub stagnant_high_stock: i32,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            critical_coverage_days: 7.0,
            low_coverage_days: 14.0,
            high_coverage_days: 30.0,
            overstock_coverage_days: 90.0,
            stagnant_low_stock: 20,
            stagnant_high_stock: 200,
        }
    }
}

/// Days until the shelf is empty at the current velocity. `None` when
/// nothing is selling, which reads as infinite coverage.
pub fn coverage_days(stock: i32, velocity: f64) -> Option<f64> {
    if velocity > 0.0 {
        Some(stock as f64 / velocity)
    } else {
        None
    }
}

/// Classify one product's stock position.
///
/// The rules are checked top down and the first match wins, so every
/// input lands in exactly one status.
pub fn classify_stock(
    stock: i32,
    velocity: f64,
    thresholds: &ClassifierThresholds,
) -> (StockStatus, StatusPriority) {
    if stock <= 0 {
        return (StockStatus::Out, StatusPriority::Critical);
    }
    match coverage_days(stock, velocity) {
        Some(days) => {
            if days < thresholds.critical_coverage_days {
                (StockStatus::CriticalLow, StatusPriority::Critical)
            } else if days <= thresholds.low_coverage_days {
                (StockStatus::Low, StatusPriority::High)
            } else if days > thresholds.overstock_coverage_days {
                (StockStatus::Overstock, StatusPriority::Medium)
            } else if days >= thresholds.high_coverage_days {
                (StockStatus::High, StatusPriority::Low)
            } else {
                (StockStatus::Normal, StatusPriority::Low)
            }
        }
        None => {
            if stock <= thresholds.stagnant_low_stock {
                (StockStatus::Low, StatusPriority::High)
            } else if stock > thresholds.stagnant_high_stock {
                (StockStatus::High, StatusPriority::Medium)
            } else {
                (StockStatus::Normal, StatusPriority::Low)
            }
        }
    }
}

/// One product's stock position with the numbers behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAssessment {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_in_stock: i32,
    pub daily_velocity: f64,
    pub coverage_days: Option<f64>,
    pub status: StockStatus,
    pub priority: StatusPriority,
}

/// Run the classifier for one product against its window totals.
/// Products with no sales in the window classify at velocity zero.
pub fn assess_product(
    product: &ProductSnapshot,
    totals: Option<&ProductSalesTotals>,
    window: SalesWindow,
    thresholds: &ClassifierThresholds,
) -> StockAssessment {
    let velocity = totals
        .map(|t| t.daily_velocity(window))
        .unwrap_or(0.0);
    let (status, priority) = classify_stock(product.quantity_in_stock, velocity, thresholds);
    StockAssessment {
        product_id: product.id,
        product_name: product.name.clone(),
        quantity_in_stock: product.quantity_in_stock,
        daily_velocity: velocity,
        coverage_days: coverage_days(product.quantity_in_stock, velocity),
        status,
        priority,
    }
}

// ============================================================================
// Reorder Insights
// ============================================================================

/// Tunable inputs for the reorder point and order size formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightParams {
    /// Days a replenishment order takes to arrive.
    pub lead_time_days: f64,
    /// Buffer multiplier on lead-time demand.
    pub safety_factor: f64,
    /// Flat cost of placing one order.
    pub order_cost: f64,
    /// Share of unit cost spent holding one unit for a year.
    pub annual_holding_rate: f64,
}

impl Default for InsightParams {
    fn default() -> Self {
        Self {
            lead_time_days: 7.0,
            safety_factor: 1.5,
            order_cost: 50.0,
            annual_holding_rate: 0.20,
        }
    }
}

/// Reorder guidance for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderAdvice {
    /// Reorder when stock drops to this level.
    pub reorder_point: u32,
    /// Suggested order size. EOQ when the product is moving, half the
    /// shelf capped at 50 units when it is not.
    pub economic_order_quantity: f64,
    pub daily_velocity: f64,
    pub coverage_days: Option<f64>,
}

/// Compute the reorder point and an economic order quantity.
///
/// The EOQ formula needs a positive velocity and a positive holding
/// cost. When either is missing the suggestion falls back to
/// `min(stock / 2, 50)` so the caller always gets a usable number.
pub fn reorder_advice(
    stock: i32,
    velocity: f64,
    unit_cost: Decimal,
    params: &InsightParams,
) -> ReorderAdvice {
    let reorder_point = (velocity * params.lead_time_days * params.safety_factor).ceil() as u32;

    let daily_holding_cost =
        unit_cost.to_f64().unwrap_or(0.0) * params.annual_holding_rate / 365.0;
    let economic_order_quantity = if velocity > 0.0 && daily_holding_cost > 0.0 {
        (2.0 * params.order_cost * velocity / daily_holding_cost)
            .sqrt()
            .round()
    } else {
        (stock as f64 * 0.5).min(50.0)
    };

    ReorderAdvice {
        reorder_point,
        economic_order_quantity,
        daily_velocity: velocity,
        coverage_days: coverage_days(stock, velocity),
    }
}

// ============================================================================
// Margin Bands
// ============================================================================

/// Mean and population standard deviation of catalog margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Margin statistics across the catalog, `None` when it is empty.
pub fn margin_stats(margins: &[f64]) -> Option<MarginStats> {
    if margins.is_empty() {
        return None;
    }
    let n = margins.len() as f64;
    let mean = margins.iter().sum::<f64>() / n;
    let variance = margins.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / n;
    Some(MarginStats {
        mean,
        std_dev: variance.sqrt(),
    })
}

/// How a product's margin sits relative to the rest of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginBand {
    Low,
    Average,
    Excellent,
}

impl MarginBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarginBand::Low => "low",
            MarginBand::Average => "average",
            MarginBand::Excellent => "excellent",
        }
    }
}

/// Band one margin against the catalog statistics. A margin is low
/// when it sits a deviation under the mean or under three quarters of
/// it, excellent when it sits a deviation above.
pub fn assess_margin(margin: f64, stats: &MarginStats) -> MarginBand {
    if margin < stats.mean - stats.std_dev || margin < stats.mean * 0.75 {
        MarginBand::Low
    } else if margin > stats.mean + stats.std_dev {
        MarginBand::Excellent
    } else {
        MarginBand::Average
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn record(days_ago: i64, quantity: f64, now: DateTime<Utc>) -> SaleRecord {
        SaleRecord {
            product_id: Some(Uuid::from_u128(1)),
            quantity,
            total_price: dec("10.00"),
            sold_at: Some(now - Duration::days(days_ago)),
        }
    }

    #[test]
    fn test_window_parse_is_lenient() {
        assert_eq!(SalesWindow::parse("week"), SalesWindow::Week);
        assert_eq!(SalesWindow::parse(" MONTH "), SalesWindow::Month);
        assert_eq!(SalesWindow::parse("quarter"), SalesWindow::Quarter);
        assert_eq!(SalesWindow::parse("year"), SalesWindow::Year);
        assert_eq!(SalesWindow::parse("all"), SalesWindow::All);
        assert_eq!(SalesWindow::parse("fortnight"), SalesWindow::All);
        assert_eq!(SalesWindow::parse(""), SalesWindow::All);
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let records = vec![
            record(0, 1.0, now),
            record(30, 1.0, now),
            record(31, 1.0, now),
        ];
        let kept = filter_by_window(&records, SalesWindow::Month, now);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_filter_drops_undated_records_for_bounded_windows() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut records = vec![record(1, 1.0, now)];
        records.push(SaleRecord {
            product_id: Some(Uuid::from_u128(2)),
            quantity: 1.0,
            total_price: dec("5.00"),
            sold_at: None,
        });
        assert_eq!(filter_by_window(&records, SalesWindow::Week, now).len(), 1);
        assert_eq!(filter_by_window(&records, SalesWindow::All, now).len(), 2);
    }

    #[test]
    fn test_aggregate_skips_unattributed_records() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let mut records = vec![record(1, 2.0, now), record(2, 3.0, now)];
        records.push(SaleRecord {
            product_id: None,
            quantity: 99.0,
            total_price: dec("990.00"),
            sold_at: Some(now),
        });
        let totals = aggregate_sales(&records);
        assert_eq!(totals.len(), 1);
        let entry = &totals[&Uuid::from_u128(1)];
        assert_eq!(entry.total_sold, 5.0);
        assert_eq!(entry.total_revenue, dec("20.00"));
        assert_eq!(entry.sales_count, 2);
        assert_eq!(entry.last_sale_at, Some(now - Duration::days(1)));
    }

    #[test]
    fn test_classifier_out_of_stock_wins() {
        let t = ClassifierThresholds::default();
        assert_eq!(
            classify_stock(0, 5.0, &t),
            (StockStatus::Out, StatusPriority::Critical)
        );
    }

    #[test]
    fn test_classifier_coverage_ladder() {
        let t = ClassifierThresholds::default();
        // 5 in stock selling 20 a month: 7.5 days of coverage
        let velocity = 20.0 / 30.0;
        let coverage = coverage_days(5, velocity).unwrap();
        assert!((coverage - 7.5).abs() < 1e-9);
        assert_eq!(
            classify_stock(5, velocity, &t),
            (StockStatus::Low, StatusPriority::High)
        );

        // just under a week of coverage is critical
        assert_eq!(
            classify_stock(6, 1.0, &t),
            (StockStatus::CriticalLow, StatusPriority::Critical)
        );
        // 20 days of coverage sits in the comfortable middle
        assert_eq!(
            classify_stock(20, 1.0, &t),
            (StockStatus::Normal, StatusPriority::Low)
        );
        // 60 days is high but not urgent
        assert_eq!(
            classify_stock(60, 1.0, &t),
            (StockStatus::High, StatusPriority::Low)
        );
        // past 90 days is overstock
        assert_eq!(
            classify_stock(91, 1.0, &t),
            (StockStatus::Overstock, StatusPriority::Medium)
        );
    }

    #[test]
    fn test_classifier_boundary_days() {
        let t = ClassifierThresholds::default();
        // exactly 7 days is low, not critical
        assert_eq!(classify_stock(7, 1.0, &t).0, StockStatus::Low);
        // exactly 14 days is still low
        assert_eq!(classify_stock(14, 1.0, &t).0, StockStatus::Low);
        // exactly 30 days is high side
        assert_eq!(classify_stock(30, 1.0, &t).0, StockStatus::High);
        // exactly 90 days is still high, not overstock
        assert_eq!(classify_stock(90, 1.0, &t).0, StockStatus::High);
    }

    #[test]
    fn test_classifier_without_sales_uses_absolute_stock() {
        let t = ClassifierThresholds::default();
        assert_eq!(
            classify_stock(20, 0.0, &t),
            (StockStatus::Low, StatusPriority::High)
        );
        assert_eq!(
            classify_stock(21, 0.0, &t),
            (StockStatus::Normal, StatusPriority::Low)
        );
        assert_eq!(
            classify_stock(201, 0.0, &t),
            (StockStatus::High, StatusPriority::Medium)
        );
    }

    #[test]
    fn test_reorder_point_rounds_up() {
        let params = InsightParams::default();
        let advice = reorder_advice(100, 1.0, dec("10.00"), &params);
        // 1.0 * 7 * 1.5 = 10.5, rounded up
        assert_eq!(advice.reorder_point, 11);
    }

    #[test]
    fn test_eoq_falls_back_without_velocity() {
        let params = InsightParams::default();
        let advice = reorder_advice(60, 0.0, dec("10.00"), &params);
        assert_eq!(advice.economic_order_quantity, 30.0);
        assert_eq!(advice.reorder_point, 0);
        assert!(advice.coverage_days.is_none());

        let advice = reorder_advice(200, 0.0, dec("10.00"), &params);
        assert_eq!(advice.economic_order_quantity, 50.0);
    }

    #[test]
    fn test_eoq_falls_back_without_holding_cost() {
        let params = InsightParams::default();
        let advice = reorder_advice(40, 2.0, Decimal::ZERO, &params);
        assert_eq!(advice.economic_order_quantity, 20.0);
    }

    #[test]
    fn test_margin_bands() {
        // margins 10, 30, 50: mean 30, population std dev ~16.33
        let stats = margin_stats(&[10.0, 30.0, 50.0]).unwrap();
        assert!((stats.mean - 30.0).abs() < 1e-9);
        assert_eq!(assess_margin(10.0, &stats), MarginBand::Low);
        assert_eq!(assess_margin(30.0, &stats), MarginBand::Average);
        assert_eq!(assess_margin(50.0, &stats), MarginBand::Excellent);
        // under three quarters of the mean is low even within one deviation
        assert_eq!(assess_margin(21.0, &stats), MarginBand::Low);
    }

    #[test]
    fn test_margin_stats_empty_catalog() {
        assert!(margin_stats(&[]).is_none());
    }
}
