//! Entity kinds and their built-in stage lists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CentralisError;
use crate::validation::EMAIL_PATTERN;

use super::reference::ReferenceData;
use super::stage::{ParseTarget, Stage};

/// Pattern for purely alphabetic localities.
const LOCALITY_PATTERN: &str = r"^[A-Za-z]+$";

/// The kinds of business record the system cleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Card,
    Store,
    Product,
    Order,
    DateEvent,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::User,
        EntityKind::Card,
        EntityKind::Store,
        EntityKind::Product,
        EntityKind::Order,
        EntityKind::DateEvent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Card => "card",
            EntityKind::Store => "store",
            EntityKind::Product => "product",
            EntityKind::Order => "order",
            EntityKind::DateEvent => "date_event",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = CentralisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized)
            .ok_or_else(|| CentralisError::Config(format!("Unknown entity kind '{}'", s)))
    }
}

/// Ordered stage list for one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub stages: Vec<Stage>,
}

impl EntitySchema {
    pub fn new(kind: EntityKind, stages: Vec<Stage>) -> Self {
        Self { kind, stages }
    }

    /// Built-in schema for `kind`, with lookups and allow-lists from `reference`.
    pub fn for_kind(kind: EntityKind, reference: &ReferenceData) -> Self {
        let stages = match kind {
            EntityKind::User => user_stages(reference),
            EntityKind::Card => card_stages(),
            EntityKind::Store => store_stages(reference),
            EntityKind::Product => product_stages(reference),
            EntityKind::Order => order_stages(),
            EntityKind::DateEvent => date_event_stages(reference),
        };
        Self::new(kind, stages)
    }
}

fn drop_columns(columns: &[&str]) -> Stage {
    Stage::DropColumns {
        columns: strings(columns),
    }
}

fn purge_nulls() -> Stage {
    purge_nulls_except(&[])
}

fn purge_nulls_except(columns: &[&str]) -> Stage {
    Stage::PurgeNulls {
        columns: None,
        except: strings(columns),
    }
}

fn reparse(column: &str, target: ParseTarget) -> Stage {
    Stage::Reparse {
        column: column.to_string(),
        target,
        optional: false,
    }
}

fn allow_list(column: &str, values: Vec<String>) -> Stage {
    Stage::AllowList {
        column: column.to_string(),
        values,
    }
}

fn matches(column: &str, pattern: &str) -> Stage {
    Stage::MatchPattern {
        column: column.to_string(),
        pattern: pattern.to_string(),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn user_stages(reference: &ReferenceData) -> Vec<Stage> {
    vec![
        drop_columns(&["index"]),
        purge_nulls(),
        reparse("date_of_birth", ParseTarget::Date),
        matches("email_address", EMAIL_PATTERN),
        allow_list("country", reference.countries()),
        Stage::Correct {
            authority: "country".to_string(),
            dependent: "country_code".to_string(),
            lookup: reference.country_codes.clone(),
        },
        Stage::NormalizePhone {
            column: "phone_number".to_string(),
        },
        reparse("join_date", ParseTarget::Date),
        purge_nulls(),
    ]
}

fn card_stages() -> Vec<Stage> {
    vec![
        purge_nulls(),
        reparse("expiry_date", ParseTarget::MonthYear),
        reparse("date_payment_confirmed", ParseTarget::Date),
        Stage::CardLength {
            number: "card_number".to_string(),
            provider: "card_provider".to_string(),
        },
        purge_nulls(),
    ]
}

fn store_stages(reference: &ReferenceData) -> Vec<Stage> {
    vec![
        drop_columns(&["index", "lat"]),
        purge_nulls(),
        reparse("longitude", ParseTarget::Float),
        reparse("latitude", ParseTarget::Float),
        reparse("staff_numbers", ParseTarget::Integer),
        matches("locality", LOCALITY_PATTERN),
        reparse("opening_date", ParseTarget::Date),
        allow_list("store_type", reference.store_types.clone()),
        allow_list("country_code", reference.country_codes_allowed()),
        Stage::Correct {
            authority: "country_code".to_string(),
            dependent: "continent".to_string(),
            lookup: reference.continents.clone(),
        },
        purge_nulls(),
    ]
}

fn product_stages(reference: &ReferenceData) -> Vec<Stage> {
    vec![
        drop_columns(&["Unnamed: 0", "index"]),
        purge_nulls_except(&["weight"]),
        Stage::LowercaseHeaders,
        allow_list("category", reference.product_categories.clone()),
        Stage::MapFlag {
            column: "removed".to_string(),
            into: "still_available".to_string(),
            true_values: reference.availability.available.clone(),
            false_values: reference.availability.removed.clone(),
        },
        Stage::ExtractPrice {
            column: "product_price".to_string(),
        },
        Stage::Reparse {
            column: "date_added".to_string(),
            target: ParseTarget::Date,
            optional: true,
        },
        // Weights without a known unit become null and classify as Unknown.
        purge_nulls_except(&["weight"]),
        Stage::ConvertWeight {
            column: "weight".to_string(),
        },
        Stage::ClassifyWeight {
            column: "weight".to_string(),
            into: "weight_class".to_string(),
        },
    ]
}

fn order_stages() -> Vec<Stage> {
    vec![
        drop_columns(&["level_0", "first_name", "last_name", "1", "index"]),
        purge_nulls(),
    ]
}

fn date_event_stages(reference: &ReferenceData) -> Vec<Stage> {
    vec![
        purge_nulls(),
        Stage::CombineDate {
            year: "year".to_string(),
            month: "month".to_string(),
            day: "day".to_string(),
            into: "date".to_string(),
        },
        reparse("timestamp", ParseTarget::TimeOfDay),
        allow_list("time_period", reference.time_periods.clone()),
        purge_nulls(),
    ]
}
