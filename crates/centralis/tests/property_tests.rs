//! Property-based tests for the normalizers and pipelines.
//!
//! Properties checked:
//! 1. **No panics**: recognizers accept any input
//! 2. **Idempotence**: normalizing normalized output changes nothing
//! 3. **Invariants**: outputs always have their canonical shape
//!
//! ```bash
//! PROPTEST_CASES=10000 cargo test -p centralis --test property_tests
//! ```

use proptest::prelude::*;

use centralis::validation::{
    card_length_matches, extract_price, normalize_phone, parse_date, parse_month_year,
    weight_to_kg,
};
use centralis::{CleaningEngine, EntityKind, RecordTable, Value, WeightClass};

// =============================================================================
// Test Strategies
// =============================================================================

/// Phone-like strings: optional prefix, digits, separators.
fn phone_like() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just(""),
            Just("+44"),
            Just("+44(0)"),
            Just("+49"),
            Just("+49(0)"),
            Just("(0)")
        ],
        "[0-9 ()\\-]{0,16}",
    )
        .prop_map(|(prefix, rest)| format!("{}{}", prefix, rest))
}

fn weight_like() -> impl Strategy<Value = String> {
    (
        0u32..100_000,
        prop_oneof![
            Just("kg"),
            Just("g"),
            Just("ml"),
            Just("l"),
            Just("oz"),
            Just(""),
            Just("lbs")
        ],
    )
        .prop_map(|(amount, unit)| format!("{}{}", amount, unit))
}

// =============================================================================
// Normalizer Properties
// =============================================================================

proptest! {
    #[test]
    fn phone_output_has_canonical_shape(raw in phone_like()) {
        if let Some(phone) = normalize_phone(&raw) {
            let (head, tail) = phone.split_at(5);
            prop_assert!(head.chars().all(|c| c.is_ascii_digit()));
            prop_assert!(tail.starts_with(' '));
            let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
            prop_assert!((10..=11).contains(&digits));
        }
    }

    #[test]
    fn phone_normalization_is_idempotent(raw in phone_like()) {
        if let Some(phone) = normalize_phone(&raw) {
            prop_assert_eq!(normalize_phone(&phone), Some(phone.clone()));
        }
    }

    #[test]
    fn recognizers_never_panic(raw in "\\PC{0,40}") {
        let _ = normalize_phone(&raw);
        let _ = parse_date(&raw);
        let _ = parse_month_year(&raw);
        let _ = extract_price(&raw);
        let _ = weight_to_kg(&raw);
        let _ = card_length_matches(&raw, &raw);
    }

    #[test]
    fn month_year_accepts_only_valid_months(month in 0u32..20, year in 0u32..100) {
        let raw = format!("{:02}/{:02}", month, year);
        prop_assert_eq!(parse_month_year(&raw).is_some(), (1..=12).contains(&month));
    }

    #[test]
    fn weights_are_non_negative_and_finite(raw in weight_like()) {
        if let Some(kg) = weight_to_kg(&raw) {
            prop_assert!(kg.is_finite());
            prop_assert!(kg >= 0.0);
        }
    }

    #[test]
    fn weight_class_is_monotonic(a in 0.0f64..1000.0, b in 0.0f64..1000.0) {
        let rank = |w: f64| match WeightClass::classify(Some(w)) {
            WeightClass::Light => 0,
            WeightClass::MidSized => 1,
            WeightClass::Heavy => 2,
            WeightClass::TruckRequired => 3,
            WeightClass::Unknown => 4,
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rank(lo) <= rank(hi));
        prop_assert!(rank(hi) < 4);
    }

    #[test]
    fn extracted_prices_have_two_decimals(pounds in 0u32..100_000, pence in 0u32..100) {
        let raw = format!("£{}.{:02}", pounds, pence);
        let price = extract_price(&raw).unwrap();
        prop_assert!((price - (pounds as f64 + pence as f64 / 100.0)).abs() < 1e-6);
    }
}

// =============================================================================
// Pipeline Properties
// =============================================================================

fn card_row() -> impl Strategy<Value = Vec<String>> {
    (
        "[0-9?]{12,19}",
        prop_oneof![Just("09/26".to_string()), "[0-9]{1,2}/[0-9]{2}"],
        prop_oneof![
            Just("VISA 16 digit".to_string()),
            Just("JCB 15 digit".to_string()),
            Just("Diners Club / Carte Blanche".to_string()),
            Just("NULL".to_string()),
        ],
        prop_oneof![
            Just("2015-11-25".to_string()),
            Just("2005 July 01".to_string()),
            "[A-Z0-9]{6}",
        ],
    )
        .prop_map(|(number, expiry, provider, confirmed)| {
            vec![number, expiry, provider, confirmed]
        })
}

proptest! {
    #[test]
    fn card_cleaning_is_idempotent_and_null_free(rows in prop::collection::vec(card_row(), 0..30)) {
        let raw = RecordTable::from_text_rows(
            vec![
                "card_number".to_string(),
                "expiry_date".to_string(),
                "card_provider".to_string(),
                "date_payment_confirmed".to_string(),
            ],
            rows,
        );
        let engine = CleaningEngine::default();
        let once = engine.clean(EntityKind::Card, &raw).unwrap();
        let twice = engine.clean(EntityKind::Card, &once).unwrap();

        prop_assert_eq!(&once, &twice);
        prop_assert!(once.row_count() <= raw.row_count());
        prop_assert!(once.rows().iter().flatten().all(|v| !v.is_null()));
        prop_assert!(once
            .column_by_name("date_payment_confirmed")
            .unwrap()
            .iter()
            .all(|v| matches!(v, Value::Date(_))));
    }
}
