//! Validators and normalizers, one concern each.
//!
//! Every function here is pure and works on a single raw value. Recognizers
//! return `None` (or `false`) when the value is unusable; the pipeline decides
//! whether that drops the row.

mod contact;
mod dates;
mod measures;
mod numeric;
mod payment;

pub use contact::{EMAIL_PATTERN, is_valid_email, normalize_phone};
pub use dates::{combine_date, parse_date, parse_month_year, parse_time_of_day};
pub use measures::{WeightClass, extract_price, weight_to_kg};
pub use numeric::{float_to_integer, parse_float, parse_integer};
pub use payment::{card_length_matches, stated_digit_count};
