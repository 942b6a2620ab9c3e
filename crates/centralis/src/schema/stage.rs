//! Stage descriptors: the atomic steps of a cleaning pipeline.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Canonical type a field is reparsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseTarget {
    /// Calendar date, rendered `YYYY-MM-DD`.
    Date,
    /// Card expiry, exactly `MM/YY`.
    MonthYear,
    /// Finite float.
    Float,
    /// Integer, decimals truncated.
    Integer,
    /// Time of day, rendered `HH:MM:SS`.
    TimeOfDay,
}

impl ParseTarget {
    pub fn label(&self) -> &'static str {
        match self {
            ParseTarget::Date => "date",
            ParseTarget::MonthYear => "MM/YY",
            ParseTarget::Float => "float",
            ParseTarget::Integer => "integer",
            ParseTarget::TimeOfDay => "time of day",
        }
    }
}

/// How a stage treats rows it cannot accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Column or header restructuring; no row judgement.
    Structural,
    /// Null values; row dropped.
    Missing,
    /// Value cannot be parsed into its canonical type; row dropped.
    Parse,
    /// Well-typed value outside its allowed domain; row dropped.
    Domain,
    /// Dependent field disagrees with its authoritative field; row corrected.
    Consistency,
    /// New column computed from existing ones.
    Derived,
}

impl IssueKind {
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::Structural => "structural",
            IssueKind::Missing => "missing",
            IssueKind::Parse => "parse",
            IssueKind::Domain => "domain",
            IssueKind::Consistency => "consistency",
            IssueKind::Derived => "derived",
        }
    }
}

/// One step of an entity cleaning pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    /// Remove columns. Absent columns are ignored.
    DropColumns { columns: Vec<String> },

    /// Remove rows with a null in any column, or only in `columns`.
    /// Columns in `except` are never checked.
    PurgeNulls {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        columns: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        except: Vec<String>,
    },

    /// Lower-case every header.
    LowercaseHeaders,

    /// Parse a field into its canonical type, dropping rows that fail.
    Reparse {
        column: String,
        target: ParseTarget,
        /// Skip the stage when the column is absent.
        #[serde(default)]
        optional: bool,
    },

    /// Build a date from year/month/day columns and drop the components.
    CombineDate {
        year: String,
        month: String,
        day: String,
        into: String,
    },

    /// Keep rows whose field matches a regular expression.
    MatchPattern { column: String, pattern: String },

    /// Keep rows whose field is one of `values`.
    AllowList { column: String, values: Vec<String> },

    /// Overwrite `dependent` with the lookup of `authority` wherever they disagree.
    Correct {
        authority: String,
        dependent: String,
        lookup: IndexMap<String, String>,
    },

    /// Normalize phone numbers, dropping those of the wrong length.
    NormalizePhone { column: String },

    /// Keep cards whose number length matches the provider's stated digit count.
    CardLength { number: String, provider: String },

    /// Map a two-valued label column to a boolean column, replacing it.
    MapFlag {
        column: String,
        into: String,
        true_values: Vec<String>,
        false_values: Vec<String>,
    },

    /// Replace free-text prices by their two-decimal amount.
    ExtractPrice { column: String },

    /// Replace free-text weights by kilograms; unrecognised units become null.
    ConvertWeight { column: String },

    /// Derive a weight class column from a kilogram weight column.
    ClassifyWeight { column: String, into: String },
}

impl Stage {
    /// Short stable name of the stage kind.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::DropColumns { .. } => "drop_columns",
            Stage::PurgeNulls { .. } => "purge_nulls",
            Stage::LowercaseHeaders => "lowercase_headers",
            Stage::Reparse { .. } => "reparse",
            Stage::CombineDate { .. } => "combine_date",
            Stage::MatchPattern { .. } => "match_pattern",
            Stage::AllowList { .. } => "allow_list",
            Stage::Correct { .. } => "correct",
            Stage::NormalizePhone { .. } => "normalize_phone",
            Stage::CardLength { .. } => "card_length",
            Stage::MapFlag { .. } => "map_flag",
            Stage::ExtractPrice { .. } => "extract_price",
            Stage::ConvertWeight { .. } => "convert_weight",
            Stage::ClassifyWeight { .. } => "classify_weight",
        }
    }

    /// Get a human-readable description of the stage.
    pub fn description(&self) -> String {
        match self {
            Stage::DropColumns { columns } => format!("Drop columns {:?}", columns),
            Stage::PurgeNulls {
                columns: None,
                except,
            } if except.is_empty() => "Purge rows with nulls".to_string(),
            Stage::PurgeNulls {
                columns: None,
                except,
            } => format!("Purge rows with nulls outside {:?}", except),
            Stage::PurgeNulls {
                columns: Some(columns),
                ..
            } => format!("Purge rows with nulls in {:?}", columns),
            Stage::LowercaseHeaders => "Lower-case headers".to_string(),
            Stage::Reparse { column, target, .. } => {
                format!("Reparse '{}' as {}", column, target.label())
            }
            Stage::CombineDate {
                year,
                month,
                day,
                into,
            } => format!("Combine '{}'/'{}'/'{}' into '{}'", year, month, day, into),
            Stage::MatchPattern { column, pattern } => {
                format!("Match '{}' against /{}/", column, pattern)
            }
            Stage::AllowList { column, values } => {
                format!("Restrict '{}' to {} allowed values", column, values.len())
            }
            Stage::Correct {
                authority,
                dependent,
                ..
            } => format!("Correct '{}' from '{}'", dependent, authority),
            Stage::NormalizePhone { column } => format!("Normalize phone numbers in '{}'", column),
            Stage::CardLength { number, provider } => {
                format!("Check '{}' length against '{}'", number, provider)
            }
            Stage::MapFlag { column, into, .. } => {
                format!("Map '{}' to boolean '{}'", column, into)
            }
            Stage::ExtractPrice { column } => format!("Extract price from '{}'", column),
            Stage::ConvertWeight { column } => format!("Convert '{}' to kilograms", column),
            Stage::ClassifyWeight { column, into } => {
                format!("Classify '{}' into '{}'", column, into)
            }
        }
    }

    /// Kind of issue the stage resolves.
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            Stage::DropColumns { .. } | Stage::LowercaseHeaders => IssueKind::Structural,
            Stage::PurgeNulls { .. } => IssueKind::Missing,
            Stage::Reparse { .. }
            | Stage::CombineDate { .. }
            | Stage::ExtractPrice { .. }
            | Stage::ConvertWeight { .. } => IssueKind::Parse,
            Stage::MatchPattern { .. }
            | Stage::AllowList { .. }
            | Stage::NormalizePhone { .. }
            | Stage::CardLength { .. }
            | Stage::MapFlag { .. } => IssueKind::Domain,
            Stage::Correct { .. } => IssueKind::Consistency,
            Stage::ClassifyWeight { .. } => IssueKind::Derived,
        }
    }
}
