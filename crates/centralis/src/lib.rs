//! Centralis: data centralisation for retail business records.
//!
//! Raw records arrive from heterogeneous sources (a relational database,
//! paged documents, an HTTP API, object storage and structured files) and
//! are cleaned by declarative per-entity pipelines into canonical tables.
//!
//! # Core Principles
//!
//! - **Declarative pipelines**: each entity kind is an ordered list of stages
//! - **Reject or correct**: a field either parses into its canonical type,
//!   is corrected from an authoritative field, or its row is dropped
//! - **Idempotent**: cleaning a cleaned table changes nothing
//!
//! # Example
//!
//! ```no_run
//! use centralis::{EntityKind, CleaningEngine, Parser};
//!
//! let raw = Parser::new().parse_file("legacy_users.csv").unwrap();
//! let (users, report) = CleaningEngine::default()
//!     .clean_with_report(EntityKind::User, &raw)
//!     .unwrap();
//!
//! println!("Kept {} of {} users", users.row_count(), report.rows_in);
//! ```

pub mod database;
pub mod error;
pub mod fetch;
pub mod input;
pub mod schema;
pub mod table;
pub mod transform;
pub mod validation;

mod extractor;

pub use crate::extractor::{
    API_KEY_VAR, ApiConfig, COUNT_URL_VAR, CentralisConfig, Extractor, STORE_URL_VAR,
    SourceLocator,
};
pub use database::{DatabaseConnector, DbCredentials};
pub use error::{CentralisError, Result};
pub use fetch::{FetchConfig, FetchOutcome, Fetcher, HttpClient, ResourceClient, RetryPolicy};
pub use input::{DocumentReader, ObjectAddress, Parser, ParserConfig};
pub use schema::{EntityKind, EntitySchema, ReferenceData, Stage};
pub use table::{RecordTable, Value};
pub use transform::{CleaningEngine, CleaningReport, StageOutcome};
pub use validation::WeightClass;

fn clean_with_defaults(kind: EntityKind, table: &RecordTable) -> Result<RecordTable> {
    CleaningEngine::default().clean(kind, table)
}

/// Clean user records with the embedded reference data.
pub fn clean_user_data(table: &RecordTable) -> Result<RecordTable> {
    clean_with_defaults(EntityKind::User, table)
}

/// Clean card records with the embedded reference data.
pub fn clean_card_data(table: &RecordTable) -> Result<RecordTable> {
    clean_with_defaults(EntityKind::Card, table)
}

/// Clean store records with the embedded reference data.
pub fn clean_store_data(table: &RecordTable) -> Result<RecordTable> {
    clean_with_defaults(EntityKind::Store, table)
}

/// Clean product records with the embedded reference data.
pub fn clean_product_data(table: &RecordTable) -> Result<RecordTable> {
    clean_with_defaults(EntityKind::Product, table)
}

/// Clean order records.
pub fn clean_order_data(table: &RecordTable) -> Result<RecordTable> {
    clean_with_defaults(EntityKind::Order, table)
}

/// Clean date-event records with the embedded reference data.
pub fn clean_date_events(table: &RecordTable) -> Result<RecordTable> {
    clean_with_defaults(EntityKind::DateEvent, table)
}
