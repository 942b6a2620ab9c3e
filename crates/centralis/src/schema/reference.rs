//! Static lookup tables and allow-lists used by the entity schemas.

use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{CentralisError, Result};

const EMBEDDED_JSON: &str = include_str!("../../data/reference.json");

static EMBEDDED: Lazy<ReferenceData> = Lazy::new(|| {
    serde_json::from_str(EMBEDDED_JSON).expect("embedded reference data is valid JSON")
});

/// Labels of a two-valued availability flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagLabels {
    /// Labels meaning the product is still on sale.
    pub available: Vec<String>,
    /// Labels meaning the product was withdrawn.
    pub removed: Vec<String>,
}

/// Immutable configuration data the pipelines consult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Country name to ISO 3166 alpha-2 code. Keys double as the country allow-list.
    pub country_codes: IndexMap<String, String>,
    /// ISO code to continent. Keys double as the country-code allow-list.
    pub continents: IndexMap<String, String>,
    pub store_types: Vec<String>,
    pub product_categories: Vec<String>,
    pub availability: FlagLabels,
    pub time_periods: Vec<String>,
}

impl ReferenceData {
    /// The reference data compiled into the library.
    pub fn embedded() -> Self {
        EMBEDDED.clone()
    }

    /// Load reference data from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CentralisError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Country names accepted for users.
    pub fn countries(&self) -> Vec<String> {
        self.country_codes.keys().cloned().collect()
    }

    /// Country codes accepted for stores.
    pub fn country_codes_allowed(&self) -> Vec<String> {
        self.continents.keys().cloned().collect()
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::embedded()
    }
}
