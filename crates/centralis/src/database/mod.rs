//! Postgres access: credentials, table listing, reads and full-replace uploads.

mod connector;
mod credentials;

pub use connector::{DatabaseConnector, SqlType, validate_identifier};
pub use credentials::DbCredentials;
