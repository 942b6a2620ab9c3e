//! Payment card checks.

use once_cell::sync::Lazy;
use regex::Regex;

static DIGIT_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*digit").unwrap());

/// Card number length stated in a provider description such as `VISA 16 digit`.
pub fn stated_digit_count(provider: &str) -> Option<usize> {
    DIGIT_COUNT
        .captures(provider)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Check a card number against its provider description.
///
/// Providers that state no digit count accept any number.
pub fn card_length_matches(card_number: &str, provider: &str) -> bool {
    match stated_digit_count(provider) {
        Some(expected) => card_number.chars().count() == expected,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stated_digit_count() {
        assert_eq!(stated_digit_count("VISA 16 digit"), Some(16));
        assert_eq!(stated_digit_count("VISA 19 digit"), Some(19));
        assert_eq!(stated_digit_count("JCB 15digit"), Some(15));
        assert_eq!(stated_digit_count("Diners Club / Carte Blanche"), None);
    }

    #[test]
    fn test_card_length_matches() {
        assert!(card_length_matches("4971858637664481", "VISA 16 digit"));
        assert!(!card_length_matches("??4971858637664481", "VISA 16 digit"));
        assert!(card_length_matches("30060773296197", "Diners Club / Carte Blanche"));
    }
}
