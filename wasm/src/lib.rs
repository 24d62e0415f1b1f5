//! WebAssembly module for Tillbook
//!
//! Client-side analytics for the point of sale:
//! - Sales window filtering and aggregation
//! - Stock status classification
//! - Cost roll-ups and margin checks
//! - Reorder insights
//! - Offline normalization of imported sales rows

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::analytics::*;
pub use shared::costing::*;
pub use shared::ingest::*;
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Milliseconds since the epoch, as the browser reports time. Callers
/// pass `Date.now()`; when they pass nothing the module asks the
/// browser itself.
fn clock(now_ms: Option<f64>) -> DateTime<Utc> {
    let ms = now_ms.unwrap_or_else(js_sys::Date::now);
    DateTime::from_timestamp_millis(ms as i64).unwrap_or_else(Utc::now)
}

fn bad_input(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| bad_input("Serialization failed", e))
}

/// Canonical name of a sales window, parsed permissively
#[wasm_bindgen]
pub fn parse_sales_window(raw: &str) -> String {
    SalesWindow::parse(raw).as_str().to_string()
}

/// Classify a single stock position with the default thresholds
#[wasm_bindgen]
pub fn classify_stock_level(stock: i32, daily_velocity: f64) -> String {
    let (status, _) = classify_stock(stock, daily_velocity, &ClassifierThresholds::default());
    status.as_str().to_string()
}

/// Days of coverage at the current velocity, negative when dormant
#[wasm_bindgen]
pub fn stock_coverage_days(stock: i32, daily_velocity: f64) -> f64 {
    coverage_days(stock, daily_velocity).unwrap_or(-1.0)
}

fn assess_stock_at(
    products: &[ProductSnapshot],
    rows: &[serde_json::Value],
    window: SalesWindow,
    thresholds: &ClassifierThresholds,
    now: DateTime<Utc>,
) -> Vec<StockAssessment> {
    let records = normalize_sales(rows);
    let windowed = filter_by_window(&records, window, now);
    let totals = aggregate_sales(&windowed);

    let mut assessments: Vec<StockAssessment> = products
        .iter()
        .map(|product| assess_product(product, totals.get(&product.id), window, thresholds))
        .collect();
    assessments.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    assessments
}

/// Run the full stock pipeline in the browser.
///
/// Takes the product catalog and raw sales rows as JSON, filters the
/// rows to the window, aggregates per product and classifies every
/// stock position. Returns the assessments as JSON, most urgent first.
/// `thresholds_json` overrides the default classifier thresholds and
/// `now_ms` pins the clock (defaults to the browser's).
#[wasm_bindgen]
pub fn assess_stock(
    products_json: &str,
    sales_json: &str,
    window: &str,
    thresholds_json: Option<String>,
    now_ms: Option<f64>,
) -> Result<String, JsValue> {
    let products: Vec<ProductSnapshot> =
        serde_json::from_str(products_json).map_err(|e| bad_input("Invalid products JSON", e))?;
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(sales_json).map_err(|e| bad_input("Invalid sales JSON", e))?;
    let thresholds = match thresholds_json {
        Some(raw) => {
            serde_json::from_str(&raw).map_err(|e| bad_input("Invalid thresholds JSON", e))?
        }
        None => ClassifierThresholds::default(),
    };

    let assessments = assess_stock_at(
        &products,
        &rows,
        SalesWindow::parse(window),
        &thresholds,
        clock(now_ms),
    );
    to_json(&assessments)
}

/// Aggregate raw sales rows per product within a window.
///
/// Returns a JSON object keyed by product id with quantity, revenue,
/// sale count and last sale timestamp for each.
#[wasm_bindgen]
pub fn window_sales_totals(
    sales_json: &str,
    window: &str,
    now_ms: Option<f64>,
) -> Result<String, JsValue> {
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(sales_json).map_err(|e| bad_input("Invalid sales JSON", e))?;

    let records = normalize_sales(&rows);
    let windowed = filter_by_window(&records, SalesWindow::parse(window), clock(now_ms));
    to_json(&aggregate_sales(&windowed))
}

/// Roll a costing sheet up to per-unit figures
#[wasm_bindgen]
pub fn unit_cost_breakdown(input_json: &str) -> Result<String, JsValue> {
    let input: CostingSheetInput =
        serde_json::from_str(input_json).map_err(|e| bad_input("Invalid costing JSON", e))?;
    to_json(&cost_breakdown(&input))
}

/// Profit margin percentage for a cost and selling price
#[wasm_bindgen]
pub fn product_profit_margin(unit_cost: f64, selling_price: f64) -> f64 {
    let cost = Decimal::try_from(unit_cost).unwrap_or(Decimal::ZERO);
    let price = Decimal::try_from(selling_price).unwrap_or(Decimal::ZERO);
    profit_margin(cost, price).to_f64().unwrap_or(0.0)
}

/// Reorder point and order size suggestion for one product.
///
/// `params_json` overrides the default lead time, safety factor, order
/// cost and holding rate.
#[wasm_bindgen]
pub fn suggest_reorder(
    stock: i32,
    daily_velocity: f64,
    unit_cost: f64,
    params_json: Option<String>,
) -> Result<String, JsValue> {
    let params = match params_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| bad_input("Invalid params JSON", e))?,
        None => InsightParams::default(),
    };
    let cost = Decimal::try_from(unit_cost).unwrap_or(Decimal::ZERO);
    to_json(&reorder_advice(stock, daily_velocity, cost, &params))
}

/// Band a product margin against the catalog mean and deviation
#[wasm_bindgen]
pub fn classify_margin_band(margin: f64, mean: f64, std_dev: f64) -> String {
    let stats = MarginStats { mean, std_dev };
    assess_margin(margin, &stats).as_str().to_string()
}

/// Normalize raw sales rows into well-formed records
#[wasm_bindgen]
pub fn normalize_sales_rows(rows_json: &str) -> Result<String, JsValue> {
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(rows_json).map_err(|e| bad_input("Invalid rows JSON", e))?;
    to_json(&normalize_sales(&rows))
}

/// Validate a SKU the same way the backend does
#[wasm_bindgen]
pub fn validate_product_sku(sku: &str) -> bool {
    validate_sku(sku).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use uuid::Uuid;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_sales_window_is_permissive() {
        assert_eq!(parse_sales_window("Week"), "week");
        assert_eq!(parse_sales_window(" MONTH "), "month");
        assert_eq!(parse_sales_window("bogus"), "all");
    }

    #[test]
    fn test_classify_stock_level_boundaries() {
        assert_eq!(classify_stock_level(0, 1.0), "out");
        assert_eq!(classify_stock_level(5, 1.0), "critical_low");
        assert_eq!(classify_stock_level(10, 1.0), "low");
        assert_eq!(classify_stock_level(20, 1.0), "normal");
        assert_eq!(classify_stock_level(40, 1.0), "high");
        assert_eq!(classify_stock_level(95, 1.0), "overstock");
    }

    #[test]
    fn test_stock_coverage_days_dormant_is_negative() {
        assert!((stock_coverage_days(30, 2.0) - 15.0).abs() < 1e-9);
        assert!(stock_coverage_days(30, 0.0) < 0.0);
    }

    #[test]
    fn test_assess_stock_at_sorts_most_urgent_first() {
        let healthy = Uuid::new_v4();
        let empty = Uuid::new_v4();
        let products = vec![
            ProductSnapshot {
                id: healthy,
                name: "Beans".to_string(),
                cost_price: Decimal::new(500, 2),
                selling_price: Decimal::new(900, 2),
                quantity_in_stock: 60,
            },
            ProductSnapshot {
                id: empty,
                name: "Milk".to_string(),
                cost_price: Decimal::new(100, 2),
                selling_price: Decimal::new(250, 2),
                quantity_in_stock: 0,
            },
        ];
        let rows = vec![json!({
            "product_id": healthy.to_string(),
            "quantity": 90,
            "total_price": "810.00",
            "sold_at": "2025-06-10T09:00:00Z",
        })];

        let assessments = assess_stock_at(
            &products,
            &rows,
            SalesWindow::Month,
            &ClassifierThresholds::default(),
            fixed_now(),
        );

        assert_eq!(assessments.len(), 2);
        assert_eq!(assessments[0].product_name, "Milk");
        assert_eq!(assessments[0].status, StockStatus::Out);
        assert_eq!(assessments[1].product_name, "Beans");
        assert!(assessments[1].daily_velocity > 0.0);
    }

    #[test]
    fn test_product_profit_margin_zero_cost_reports_zero() {
        assert_eq!(product_profit_margin(0.0, 10.0), 0.0);
        let margin = product_profit_margin(6.0, 10.0);
        assert!((margin - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_classify_margin_band() {
        assert_eq!(classify_margin_band(10.0, 30.0, 5.0), "low");
        assert_eq!(classify_margin_band(30.0, 30.0, 5.0), "average");
        assert_eq!(classify_margin_band(45.0, 30.0, 5.0), "excellent");
    }

    #[test]
    fn test_validate_product_sku() {
        assert!(validate_product_sku("ESP-001"));
        assert!(!validate_product_sku(""));
    }
}
