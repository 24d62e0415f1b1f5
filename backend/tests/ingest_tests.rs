//! Tests for sales row normalization
//!
//! Imported files spell fields half a dozen ways; these tests pin the
//! accepted spellings and the degradation rules for bad values.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use shared::ingest::{normalize_sale, normalize_sales, safe_amount, safe_number};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// =============================================================================
// Safe numeric coercion
// =============================================================================

mod coercion {
    use super::*;

    #[test]
    fn numbers_and_numeric_strings_pass_through() {
        assert_eq!(safe_number(&json!(3.5)), 3.5);
        assert_eq!(safe_number(&json!("12")), 12.0);
        assert_eq!(safe_number(&json!("  7.25  ")), 7.25);
    }

    #[test]
    fn garbage_collapses_to_zero() {
        assert_eq!(safe_number(&json!("three")), 0.0);
        assert_eq!(safe_number(&json!(null)), 0.0);
        assert_eq!(safe_number(&json!({"nested": true})), 0.0);
        assert_eq!(safe_number(&json!("NaN")), 0.0);
        assert_eq!(safe_number(&json!("inf")), 0.0);
    }

    #[test]
    fn amounts_coerce_to_decimal_or_zero() {
        assert_eq!(safe_amount(&json!("19.99")), dec("19.99"));
        assert_eq!(safe_amount(&json!(5)), dec("5"));
        assert_eq!(safe_amount(&json!("not money")), Decimal::ZERO);
        assert_eq!(safe_amount(&json!(false)), Decimal::ZERO);
    }
}

// =============================================================================
// Row normalization
// =============================================================================

mod normalization {
    use super::*;

    #[test]
    fn canonical_rows_map_straight_across() {
        let id = Uuid::from_u128(9);
        let row = json!({
            "product_id": id.to_string(),
            "quantity": 3,
            "total_price": "27.00",
            "sold_at": "2025-06-01T10:00:00Z",
        });

        let record = normalize_sale(&row).unwrap();
        assert_eq!(record.product_id, Some(id));
        assert_eq!(record.quantity, 3.0);
        assert_eq!(record.total_price, dec("27.00"));
        assert_eq!(
            record.sold_at,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn alternate_spellings_are_accepted() {
        let id = Uuid::from_u128(10);
        let row = json!({
            "productId": id.to_string(),
            "qty": "2",
            "totalPrice": 18,
            "date": "2025-06-01",
        });

        let record = normalize_sale(&row).unwrap();
        assert_eq!(record.product_id, Some(id));
        assert_eq!(record.quantity, 2.0);
        assert_eq!(record.total_price, dec("18"));
        assert_eq!(
            record.sold_at,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn nested_product_objects_resolve_too() {
        let id = Uuid::from_u128(11);
        let row = json!({
            "product": {"id": id.to_string(), "name": "Croissant"},
            "amount": "3.50",
            "quantity": 1,
        });

        let record = normalize_sale(&row).unwrap();
        assert_eq!(record.product_id, Some(id));
        assert_eq!(record.total_price, dec("3.50"));
    }

    #[test]
    fn malformed_fields_degrade_without_dropping_the_row() {
        let row = json!({
            "product_id": "not-a-uuid",
            "quantity": "many",
            "total_price": null,
            "sold_at": "yesterday",
        });

        let record = normalize_sale(&row).unwrap();
        assert_eq!(record.product_id, None);
        assert_eq!(record.quantity, 0.0);
        assert_eq!(record.total_price, Decimal::ZERO);
        assert_eq!(record.sold_at, None);
    }

    #[test]
    fn only_non_objects_are_dropped() {
        let rows = vec![
            json!({"quantity": 1}),
            json!("just a string"),
            json!(42),
            json!({"qty": 2}),
        ];

        let records = normalize_sales(&rows);
        assert_eq!(records.len(), 2);
    }
}

// =============================================================================
// Property tests
// =============================================================================

fn arbitrary_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<f64>().prop_map(|f| json!(f)),
        "[a-zA-Z0-9 .-]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::hash_map("[a-z_]{1,10}", inner, 0..4)
                .prop_map(|m| Value::from(serde_json::Map::from_iter(m))),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The coercion never produces NaN or infinity
    #[test]
    fn prop_safe_number_is_always_finite(value in arbitrary_json()) {
        prop_assert!(safe_number(&value).is_finite());
    }

    /// Normalization accepts any JSON without panicking, and keeps a
    /// record only for objects
    #[test]
    fn prop_normalize_never_panics(value in arbitrary_json()) {
        let record = normalize_sale(&value);
        prop_assert_eq!(record.is_some(), value.is_object());
    }
}
