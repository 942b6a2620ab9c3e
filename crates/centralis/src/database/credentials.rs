//! Database credentials loaded from a YAML key-value file.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;

use crate::error::{CentralisError, Result};

fn default_port() -> u16 {
    5432
}

/// Connection parameters for a Postgres database.
///
/// The file uses the keys `RDS_HOST`, `RDS_PASSWORD`, `RDS_USER`,
/// `RDS_DATABASE` and `RDS_PORT`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DbCredentials {
    #[serde(rename = "RDS_HOST")]
    pub host: String,
    #[serde(rename = "RDS_PASSWORD")]
    pub password: String,
    #[serde(rename = "RDS_USER")]
    pub user: String,
    #[serde(rename = "RDS_DATABASE")]
    pub database: String,
    #[serde(rename = "RDS_PORT", default = "default_port")]
    pub port: u16,
}

impl DbCredentials {
    /// Parse credentials from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load credentials from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CentralisError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Connection options for the sqlx Postgres driver.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("host", &self.host)
            .field("password", &"<redacted>")
            .field("user", &self.user)
            .field("database", &self.database)
            .field("port", &self.port)
            .finish()
    }
}
