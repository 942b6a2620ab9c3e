//! Date and time recognizers.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Date-only layouts seen across the sources, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y %B %d",
    "%B %Y %d",
    "%d %B %Y",
    "%B %d %Y",
    "%m/%d/%Y",
];

/// Date-time layouts whose date part is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

static MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").unwrap());

/// Parse a date written in any of the recognised layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Accept a card expiry only in the exact `MM/YY` form.
pub fn parse_month_year(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    MONTH_YEAR.is_match(trimmed).then(|| trimmed.to_string())
}

/// Extract the time of day from a bare time or a full timestamp.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.time())
        })
}

/// Build a calendar date from its components. Impossible dates yield `None`.
pub fn combine_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let year = i32::try_from(year).ok()?;
    let month = u32::try_from(month).ok()?;
    let day = u32::try_from(day).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_layouts() {
        assert_eq!(parse_date("1968-10-16"), Some(ymd(1968, 10, 16)));
        assert_eq!(parse_date("1951/01/27"), Some(ymd(1951, 1, 27)));
        assert_eq!(parse_date("2005 January 27"), Some(ymd(2005, 1, 27)));
        assert_eq!(parse_date("January 1951 27"), Some(ymd(1951, 1, 27)));
        assert_eq!(parse_date("October 2012 08"), Some(ymd(2012, 10, 8)));
        assert_eq!(parse_date("2015-11-25 14:29:36"), Some(ymd(2015, 11, 25)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date("GONLM9G9Z4"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2021-02-30"), None);
    }

    #[test]
    fn test_parse_month_year_is_strict() {
        assert_eq!(parse_month_year("09/26"), Some("09/26".to_string()));
        assert_eq!(parse_month_year("9/26"), None);
        assert_eq!(parse_month_year("13/26"), None);
        assert_eq!(parse_month_year("09/2026"), None);
        assert_eq!(parse_month_year("NB71VBAHJE"), None);
    }

    #[test]
    fn test_parse_time_of_day() {
        let expected = NaiveTime::from_hms_opt(22, 0, 6).unwrap();
        assert_eq!(parse_time_of_day("22:00:06"), Some(expected));
        assert_eq!(parse_time_of_day("2019-07-01 22:00:06"), Some(expected));
        assert_eq!(parse_time_of_day("late"), None);
    }

    #[test]
    fn test_combine_date_rejects_impossible_days() {
        assert_eq!(combine_date(2012, 9, 19), Some(ymd(2012, 9, 19)));
        assert_eq!(combine_date(2012, 9, 31), None);
        assert_eq!(combine_date(2012, 13, 1), None);
        assert_eq!(combine_date(2012, -1, 1), None);
    }
}
