//! Numeric coercion.

/// Parse a finite float, tolerating surrounding whitespace.
pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer. Decimal text is accepted and truncated toward zero.
pub fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| parse_float(trimmed).and_then(float_to_integer))
}

/// Truncate a finite float into the `i64` range.
pub fn float_to_integer(value: f64) -> Option<i64> {
    let truncated = value.trunc();
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(" -0.1 "), Some(-0.1));
        assert_eq!(parse_float("N/A"), None);
        assert_eq!(parse_float("inf"), None);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("34"), Some(34));
        assert_eq!(parse_integer("12.0"), Some(12));
        assert_eq!(parse_integer("J78"), None);
        assert_eq!(parse_integer("3n9"), None);
    }
}
