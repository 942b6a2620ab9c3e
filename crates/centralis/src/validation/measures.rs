//! Prices, weights and weight classes.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PRICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d+\.\d{2})\b").unwrap());

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)?").unwrap());

/// Kilograms per ounce.
const KG_PER_OUNCE: f64 = 0.0283495;

/// Extract a two-decimal amount (`39.99` out of `£39.99`).
pub fn extract_price(raw: &str) -> Option<f64> {
    PRICE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Convert a free-text weight to kilograms.
///
/// Whitespace is removed and the text lower-cased; the leading number is
/// scaled by the first unit found. Compound tokens are checked before the
/// tokens they contain (`kg` before `g`, `ml` before `l`). Litres count as
/// kilograms one to one.
pub fn weight_to_kg(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let amount: f64 = LEADING_NUMBER.find(&cleaned)?.as_str().parse().ok()?;

    let factor = if cleaned.contains("kg") {
        1.0
    } else if cleaned.contains("ml") {
        0.001
    } else if cleaned.contains("oz") {
        KG_PER_OUNCE
    } else if cleaned.contains('g') {
        0.001
    } else if cleaned.contains('l') {
        1.0
    } else {
        return None;
    };

    Some(amount * factor)
}

/// Shipping class derived from weight in kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightClass {
    Light,
    #[serde(rename = "Mid_Sized")]
    MidSized,
    Heavy,
    #[serde(rename = "Truck_Required")]
    TruckRequired,
    Unknown,
}

impl WeightClass {
    /// Classify a weight: `<2` light, `<40` mid-sized, `<140` heavy, otherwise
    /// truck. Missing or NaN weights are unknown.
    pub fn classify(weight: Option<f64>) -> Self {
        match weight {
            Some(w) if w.is_nan() => WeightClass::Unknown,
            Some(w) if w < 2.0 => WeightClass::Light,
            Some(w) if w < 40.0 => WeightClass::MidSized,
            Some(w) if w < 140.0 => WeightClass::Heavy,
            Some(_) => WeightClass::TruckRequired,
            None => WeightClass::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeightClass::Light => "Light",
            WeightClass::MidSized => "Mid_Sized",
            WeightClass::Heavy => "Heavy",
            WeightClass::TruckRequired => "Truck_Required",
            WeightClass::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for WeightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: Option<f64>, expected: f64) -> bool {
        actual.is_some_and(|v| (v - expected).abs() < 1e-9)
    }

    #[test]
    fn test_extract_price() {
        assert_eq!(extract_price("£39.99"), Some(39.99));
        assert_eq!(extract_price("12.50 GBP"), Some(12.5));
        assert_eq!(extract_price("£39.999"), None);
        assert_eq!(extract_price("£40"), None);
        assert_eq!(extract_price("XCD69KUI0K"), None);
    }

    #[test]
    fn test_weight_units() {
        assert!(approx(weight_to_kg("200g"), 0.2));
        assert!(approx(weight_to_kg("1kg"), 1.0));
        assert!(approx(weight_to_kg("3oz"), 0.0850485));
        assert!(approx(weight_to_kg("77l"), 77.0));
        assert!(approx(weight_to_kg("500ml"), 0.5));
        assert!(approx(weight_to_kg(" 1.6 KG "), 1.6));
        assert_eq!(weight_to_kg("abc"), None);
        assert_eq!(weight_to_kg("12"), None);
    }

    #[test]
    fn test_weight_class_thresholds() {
        assert_eq!(WeightClass::classify(Some(1.5)), WeightClass::Light);
        assert_eq!(WeightClass::classify(Some(2.0)), WeightClass::MidSized);
        assert_eq!(WeightClass::classify(Some(39.9)), WeightClass::MidSized);
        assert_eq!(WeightClass::classify(Some(40.0)), WeightClass::Heavy);
        assert_eq!(WeightClass::classify(Some(140.0)), WeightClass::TruckRequired);
        assert_eq!(WeightClass::classify(Some(f64::NAN)), WeightClass::Unknown);
        assert_eq!(WeightClass::classify(None), WeightClass::Unknown);
    }
}
