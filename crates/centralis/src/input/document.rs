//! Document sources: tabular content spread over one or more pages.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CentralisError, Result};
use crate::fetch::ResourceClient;
use crate::table::RecordTable;

use super::parser::Parser;

/// Reads a document into raw tables, one per page.
///
/// Byte-level decoding is up to the implementation; callers only see
/// record tables.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    /// Read every page of the document at `location`.
    async fn read_pages(&self, location: &str) -> Result<Vec<RecordTable>>;

    /// Read the whole document as a single table.
    async fn read(&self, location: &str) -> Result<RecordTable> {
        let pages = self.read_pages(location).await?;
        if pages.is_empty() {
            return Err(CentralisError::EmptyData(format!(
                "Document '{}' has no pages",
                location
            )));
        }
        Ok(RecordTable::concat(pages))
    }
}

/// Reads delimited text documents from a local path or an HTTP(S) URL.
///
/// Each document is a single page.
pub struct DelimitedDocumentReader {
    parser: Parser,
    client: Option<Arc<dyn ResourceClient>>,
}

impl DelimitedDocumentReader {
    /// Reader for local files only.
    pub fn new(parser: Parser) -> Self {
        Self {
            parser,
            client: None,
        }
    }

    /// Reader that also fetches `http://` and `https://` locations.
    pub fn with_client(parser: Parser, client: Arc<dyn ResourceClient>) -> Self {
        Self {
            parser,
            client: Some(client),
        }
    }

    async fn load(&self, location: &str) -> Result<Vec<u8>> {
        if is_remote(location) {
            let client = self.client.as_ref().ok_or_else(|| {
                CentralisError::Config(format!(
                    "No HTTP client configured to read '{}'",
                    location
                ))
            })?;
            return Ok(client.get_bytes(location).await?);
        }

        let path = Path::new(location);
        tokio::fs::read(path).await.map_err(|e| CentralisError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[async_trait]
impl DocumentReader for DelimitedDocumentReader {
    async fn read_pages(&self, location: &str) -> Result<Vec<RecordTable>> {
        let bytes = self.load(location).await?;
        let table = self.parser.parse_bytes(&bytes)?;
        tracing::debug!(location, rows = table.row_count(), "Read document");
        Ok(vec![table])
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct PagedReader;

    #[async_trait]
    impl DocumentReader for PagedReader {
        async fn read_pages(&self, _location: &str) -> Result<Vec<RecordTable>> {
            let parser = Parser::new();
            Ok(vec![
                parser.parse_bytes(b"card_number,expiry_date\n4971858637664481,09/26\n")?,
                parser.parse_bytes(b"card_number,expiry_date,card_provider\n30060773296197,09/25,Diners Club / Carte Blanche\n")?,
            ])
        }
    }

    #[tokio::test]
    async fn test_pages_are_concatenated() {
        let table = PagedReader.read("card_details.pdf").await.unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 3);
        assert!(table.value(0, "card_provider").unwrap().is_null());
    }

    #[tokio::test]
    async fn test_reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\tb\n1\t2").unwrap();

        let reader = DelimitedDocumentReader::new(Parser::new());
        let table = reader.read(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(table.headers(), &["a", "b"]);
    }

    #[tokio::test]
    async fn test_remote_without_client_is_config_error() {
        let reader = DelimitedDocumentReader::new(Parser::new());
        let err = reader.read("https://example.com/cards.csv").await.unwrap_err();
        assert!(matches!(err, CentralisError::Config(_)));
    }
}
