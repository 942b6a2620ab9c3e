//! Extraction façade and its configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::database::{DatabaseConnector, DbCredentials};
use crate::error::{CentralisError, Result};
use crate::fetch::{FetchConfig, FetchOutcome, Fetcher, HttpClient, ResourceClient};
use crate::input::{
    DelimitedDocumentReader, DocumentReader, HttpObjectStore, ObjectAddress, Parser, ParserConfig,
    StructuredFileReader,
};
use crate::schema::{EntityKind, ReferenceData};
use crate::table::RecordTable;
use crate::transform::{CleaningEngine, CleaningReport};

/// Environment variable holding the store API key.
pub const API_KEY_VAR: &str = "CENTRALIS_API_KEY";
/// Environment variable holding the store count endpoint.
pub const COUNT_URL_VAR: &str = "CENTRALIS_COUNT_URL";
/// Environment variable holding the per-store URL template.
pub const STORE_URL_VAR: &str = "CENTRALIS_STORE_URL";

/// Store API endpoints and credentials.
#[derive(Clone)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    /// Endpoint answering `{"number_stores": N}`.
    pub count_url: Option<String>,
    /// Per-store URL with a `{}` slot for the store index.
    pub store_url_template: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            count_url: None,
            store_url_template: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    /// Read endpoints and key from the environment. Unset variables stay `None`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: var(API_KEY_VAR),
            count_url: var(COUNT_URL_VAR),
            store_url_template: var(STORE_URL_VAR),
            ..Self::default()
        }
    }

    fn require<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str> {
        value.as_deref().ok_or_else(|| {
            CentralisError::Config(format!("{} is not set", var))
        })
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("count_url", &self.count_url)
            .field("store_url_template", &self.store_url_template)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Configuration for extraction and cleaning.
#[derive(Debug, Clone, Default)]
pub struct CentralisConfig {
    /// Batch fetch configuration.
    pub fetch: FetchConfig,
    /// Store API configuration.
    pub api: ApiConfig,
    /// Delimited text parser configuration.
    pub parser: ParserConfig,
    /// Lookup tables and allow-lists for the pipelines.
    pub reference: ReferenceData,
    /// YAML credentials file for the source database.
    pub credentials_path: Option<PathBuf>,
}

impl CentralisConfig {
    /// Defaults with API settings taken from the environment.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            ..Self::default()
        }
    }
}

/// Where raw records come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLocator {
    /// A table in the connected database.
    Database { table: String },
    /// A delimited document at a local path or URL.
    Document { location: String },
    /// Every store from the store API.
    StoreApi,
    /// An object in S3-style storage.
    Object { address: ObjectAddress },
    /// A JSON file by URL.
    Structured { url: String },
}

/// One entry point per data source, plus extract-and-clean.
pub struct Extractor {
    config: CentralisConfig,
    engine: CleaningEngine,
    api_client: Arc<HttpClient>,
    public_client: Arc<HttpClient>,
    database: Option<DatabaseConnector>,
}

impl Extractor {
    /// Create an extractor. No connection is opened until a source is read.
    pub fn new(config: CentralisConfig) -> Result<Self> {
        let api_client = HttpClient::new(config.api.api_key.as_deref(), config.api.timeout)?;
        let public_client = HttpClient::anonymous(config.api.timeout)?;
        Ok(Self {
            engine: CleaningEngine::new(config.reference.clone()),
            config,
            api_client: Arc::new(api_client),
            public_client: Arc::new(public_client),
            database: None,
        })
    }

    /// Use an already open database connection.
    pub fn with_database(mut self, database: DatabaseConnector) -> Self {
        self.database = Some(database);
        self
    }

    pub fn config(&self) -> &CentralisConfig {
        &self.config
    }

    pub fn engine(&self) -> &CleaningEngine {
        &self.engine
    }

    /// Connect to the database named by the configured credentials file.
    pub async fn connect_database(&mut self) -> Result<&DatabaseConnector> {
        if self.database.is_none() {
            let path = self.config.credentials_path.as_ref().ok_or_else(|| {
                CentralisError::Config("No database credentials file configured".to_string())
            })?;
            let credentials = DbCredentials::from_yaml_file(path)?;
            self.database = Some(DatabaseConnector::connect(&credentials).await?);
        }
        self.database
            .as_ref()
            .ok_or_else(|| CentralisError::Config("Database connection unavailable".to_string()))
    }

    fn database(&self) -> Result<&DatabaseConnector> {
        self.database.as_ref().ok_or_else(|| {
            CentralisError::Config("No database connection; call connect_database first".to_string())
        })
    }

    /// Tables available in the source database.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.database()?.list_tables().await
    }

    /// Read a database table.
    pub async fn read_database_table(&self, table: &str) -> Result<RecordTable> {
        self.database()?.read_table(table).await
    }

    /// Read every page of a delimited document.
    pub async fn read_document(&self, location: &str) -> Result<RecordTable> {
        let client: Arc<dyn ResourceClient> = self.public_client.clone();
        DelimitedDocumentReader::with_client(self.parser(), client)
            .read(location)
            .await
    }

    /// Number of stores the API reports.
    pub async fn count_stores(&self) -> Result<usize> {
        let url = ApiConfig::require(&self.config.api.count_url, COUNT_URL_VAR)?;
        self.fetcher().fetch_count(url).await
    }

    /// Fetch every store, keeping partial results when some requests fail.
    pub async fn fetch_stores_outcome(&self) -> Result<FetchOutcome> {
        let template = ApiConfig::require(&self.config.api.store_url_template, STORE_URL_VAR)?;
        let count = self.count_stores().await?;
        self.fetcher().fetch_all(template, count).await
    }

    /// Fetch every store. Fails with [`CentralisError::AllFetchesFailed`]
    /// when no store could be retrieved.
    pub async fn fetch_stores(&self) -> Result<RecordTable> {
        let outcome = self.fetch_stores_outcome().await?;
        if !outcome.failures().is_empty() {
            tracing::warn!(
                failed = outcome.failures().len(),
                "Some stores could not be fetched"
            );
        }
        outcome.into_table()
    }

    /// Read an object from S3-style storage.
    pub async fn read_object(&self, address: &ObjectAddress) -> Result<RecordTable> {
        HttpObjectStore::new(self.public_client.clone(), self.parser())
            .get_table(address)
            .await
    }

    /// Read a JSON file by URL.
    pub async fn read_structured(&self, url: &str) -> Result<RecordTable> {
        StructuredFileReader::new(self.public_client.clone())
            .read(url)
            .await
    }

    /// Read raw records from any source.
    pub async fn extract(&self, source: &SourceLocator) -> Result<RecordTable> {
        match source {
            SourceLocator::Database { table } => self.read_database_table(table).await,
            SourceLocator::Document { location } => self.read_document(location).await,
            SourceLocator::StoreApi => self.fetch_stores().await,
            SourceLocator::Object { address } => self.read_object(address).await,
            SourceLocator::Structured { url } => self.read_structured(url).await,
        }
    }

    /// Read raw records and clean them as `kind`.
    pub async fn extract_and_clean(
        &self,
        source: &SourceLocator,
        kind: EntityKind,
    ) -> Result<(RecordTable, CleaningReport)> {
        let raw = self.extract(source).await?;
        self.engine.clean_with_report(kind, &raw)
    }

    fn parser(&self) -> Parser {
        Parser::with_config(self.config.parser.clone())
    }

    fn fetcher(&self) -> Fetcher<HttpClient> {
        Fetcher::with_shared_client(self.api_client.clone(), self.config.fetch.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_debug_redacts_key() {
        let config = ApiConfig {
            api_key: Some("top-secret".to_string()),
            ..ApiConfig::default()
        };
        assert!(!format!("{:?}", config).contains("top-secret"));
    }

    #[tokio::test]
    async fn test_store_fetch_requires_endpoints() {
        let extractor = Extractor::new(CentralisConfig::default()).unwrap();
        let err = extractor.fetch_stores().await.unwrap_err();
        assert!(matches!(err, CentralisError::Config(ref m) if m.contains(STORE_URL_VAR)));
    }

    #[tokio::test]
    async fn test_database_source_requires_connection() {
        let extractor = Extractor::new(CentralisConfig::default()).unwrap();
        let source = SourceLocator::Database {
            table: "legacy_users".to_string(),
        };
        assert!(matches!(
            extractor.extract(&source).await,
            Err(CentralisError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_and_clean_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"index,date_uuid,user_uuid,card_number,store_code,product_code,product_quantity,first_name,last_name,1,level_0\n\
              0,9476f17e,93caf182,30060773296197,BL-8387506C,R7-3126933h,3,Ann,Lee,,0\n",
        )
        .unwrap();

        let extractor = Extractor::new(CentralisConfig::default()).unwrap();
        let source = SourceLocator::Document {
            location: file.path().to_string_lossy().into_owned(),
        };
        let (orders, report) = extractor
            .extract_and_clean(&source, EntityKind::Order)
            .await
            .unwrap();

        assert_eq!(orders.row_count(), 1);
        assert!(!orders.has_column("first_name"));
        assert!(!orders.has_column("1"));
        assert_eq!(report.rows_dropped(), 0);
    }
}
