//! Structured (JSON) files addressed by URL.

use std::sync::Arc;

use crate::error::Result;
use crate::fetch::ResourceClient;
use crate::table::RecordTable;

/// Reads JSON files in either record or column layout.
pub struct StructuredFileReader {
    client: Arc<dyn ResourceClient>,
}

impl StructuredFileReader {
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self { client }
    }

    /// Fetch `url` and decode it into a raw table.
    pub async fn read(&self, url: &str) -> Result<RecordTable> {
        let body = self.client.get_json(url).await?;
        let table = RecordTable::from_json(&body)?;
        tracing::info!(url, rows = table.row_count(), "Read structured file");
        Ok(table)
    }
}
