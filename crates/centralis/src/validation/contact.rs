//! Email and phone number checks.

use once_cell::sync::Lazy;
use regex::Regex;

/// `local-part@domain.tld` with an alphanumeric/`_.+-` local part.
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+$";

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(EMAIL_PATTERN).unwrap());

// Longest prefixes first so `+44(0)` is not consumed as `+44` followed by `(0)`.
static NATIONAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+44\(0\)|\+49\(0\)|\+44|\+49|\(0\)").unwrap());

/// Digit counts a normalized phone number may have.
const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 10..=11;

/// Split point of the formatted phone number.
const PHONE_GROUP: usize = 5;

pub fn is_valid_email(raw: &str) -> bool {
    EMAIL.is_match(raw)
}

/// Normalize a phone number to `NNNNN NNNNNN`.
///
/// National prefixes collapse to a single leading `0`, every non-digit is
/// stripped, and only 10 or 11 digit numbers survive.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let replaced = NATIONAL_PREFIX.replace_all(raw, "0");
    let digits: String = replaced.chars().filter(|c| c.is_ascii_digit()).collect();

    if !PHONE_DIGITS.contains(&digits.len()) {
        return None;
    }

    let (head, tail) = digits.split_at(PHONE_GROUP);
    Some(format!("{} {}", head, tail))
}
