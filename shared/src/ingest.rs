//! Normalization for sales rows arriving from outside the typed API
//!
//! Imported files and older client builds spell fields differently and
//! mix strings with numbers. Everything funnels through here before it
//! reaches the analytics pipeline, so one bad row never aborts a run.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::models::SaleRecord;

/// Coerce a JSON value to a finite f64.
///
/// Numeric strings are parsed; anything non-numeric or non-finite
/// (including string forms like "NaN") collapses to 0.
pub fn safe_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => f,
        _ => 0.0,
    }
}

/// Coerce a JSON value to a monetary Decimal, 0 on anything unusable.
pub fn safe_amount(value: &Value) -> Decimal {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Decimal::ZERO,
    };
    raw.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

/// First non-null field among the accepted spellings.
fn field<'a>(row: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let map = row.as_object()?;
    names
        .iter()
        .filter_map(|name| map.get(*name))
        .find(|v| !v.is_null())
}

fn parse_uuid(value: &Value) -> Option<Uuid> {
    value.as_str().and_then(|s| Uuid::parse_str(s.trim()).ok())
}

/// Parse a timestamp leniently: RFC 3339 first, then a bare date
/// (taken as midnight UTC). Unparseable input becomes `None`.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

/// Normalize one raw sale row into a [`SaleRecord`].
///
/// Returns `None` only when the row is not an object. Missing or
/// malformed fields inside an object degrade to their empty values
/// (quantity 0, amount 0, no product, no timestamp) so downstream
/// stages decide what to drop.
pub fn normalize_sale(row: &Value) -> Option<SaleRecord> {
    row.as_object()?;

    let product_id = field(row, &["product_id", "productId"])
        .and_then(parse_uuid)
        .or_else(|| {
            field(row, &["product"])
                .and_then(|p| field(p, &["id"]))
                .and_then(parse_uuid)
        });
    let quantity = field(row, &["quantity", "qty"])
        .map(safe_number)
        .unwrap_or(0.0);
    let total_price = field(row, &["total_price", "totalPrice", "amount"])
        .map(safe_amount)
        .unwrap_or(Decimal::ZERO);
    let sold_at = field(row, &["sold_at", "date", "created_at", "timestamp"])
        .and_then(parse_timestamp);

    Some(SaleRecord {
        product_id,
        quantity,
        total_price,
        sold_at,
    })
}

/// Normalize a batch of raw rows, dropping anything that is not an object.
pub fn normalize_sales(rows: &[Value]) -> Vec<SaleRecord> {
    rows.iter().filter_map(normalize_sale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_safe_number_accepts_numbers_and_numeric_strings() {
        assert_eq!(safe_number(&json!(4)), 4.0);
        assert_eq!(safe_number(&json!(2.5)), 2.5);
        assert_eq!(safe_number(&json!("3.25")), 3.25);
        assert_eq!(safe_number(&json!(" 7 ")), 7.0);
    }

    #[test]
    fn test_safe_number_collapses_junk_to_zero() {
        assert_eq!(safe_number(&json!("twelve")), 0.0);
        assert_eq!(safe_number(&json!("NaN")), 0.0);
        assert_eq!(safe_number(&json!("inf")), 0.0);
        assert_eq!(safe_number(&json!(null)), 0.0);
        assert_eq!(safe_number(&json!({"nested": 1})), 0.0);
        assert_eq!(safe_number(&json!([1, 2])), 0.0);
    }

    #[test]
    fn test_safe_amount_parses_money_strings() {
        assert_eq!(safe_amount(&json!("19.99")), Decimal::new(1999, 2));
        assert_eq!(safe_amount(&json!(120)), Decimal::from(120));
        assert_eq!(safe_amount(&json!("not money")), Decimal::ZERO);
        assert_eq!(safe_amount(&json!(true)), Decimal::ZERO);
    }

    #[test]
    fn test_normalize_sale_snake_case_row() {
        let row = json!({
            "product_id": "7f8a3b1c-2e4d-4a6b-9c0d-1e2f3a4b5c6d",
            "quantity": 3,
            "total_price": "45.00",
            "sold_at": "2025-02-10T14:30:00Z",
        });
        let record = normalize_sale(&row).unwrap();
        assert!(record.product_id.is_some());
        assert_eq!(record.quantity, 3.0);
        assert_eq!(record.total_price, Decimal::from(45));
        assert!(record.sold_at.is_some());
    }

    #[test]
    fn test_normalize_sale_camel_case_aliases() {
        let row = json!({
            "productId": "7f8a3b1c-2e4d-4a6b-9c0d-1e2f3a4b5c6d",
            "qty": "2",
            "totalPrice": 30.5,
            "date": "2025-02-10",
        });
        let record = normalize_sale(&row).unwrap();
        assert!(record.product_id.is_some());
        assert_eq!(record.quantity, 2.0);
        assert_eq!(record.total_price, Decimal::new(305, 1));
        let ts = record.sold_at.unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-02-10T00:00:00+00:00");
    }

    #[test]
    fn test_normalize_sale_nested_product_object() {
        let row = json!({
            "product": { "id": "7f8a3b1c-2e4d-4a6b-9c0d-1e2f3a4b5c6d", "name": "Beans" },
            "amount": "12.00",
            "quantity": 1,
        });
        let record = normalize_sale(&row).unwrap();
        assert!(record.product_id.is_some());
        assert_eq!(record.total_price, Decimal::from(12));
    }

    #[test]
    fn test_normalize_sale_degrades_missing_fields() {
        let record = normalize_sale(&json!({})).unwrap();
        assert!(record.product_id.is_none());
        assert_eq!(record.quantity, 0.0);
        assert_eq!(record.total_price, Decimal::ZERO);
        assert!(record.sold_at.is_none());
    }

    #[test]
    fn test_normalize_sale_bad_timestamp_becomes_none() {
        let row = json!({ "quantity": 1, "sold_at": "last tuesday" });
        let record = normalize_sale(&row).unwrap();
        assert!(record.sold_at.is_none());
    }

    #[test]
    fn test_normalize_sales_drops_non_objects() {
        let rows = vec![json!({"quantity": 1}), json!("garbage"), json!(42), json!(null)];
        let records = normalize_sales(&rows);
        assert_eq!(records.len(), 1);
    }
}
