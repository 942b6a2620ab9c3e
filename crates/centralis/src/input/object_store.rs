//! Objects in an S3-style bucket, fetched over HTTPS.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::Url;

use crate::error::{CentralisError, Result};
use crate::fetch::ResourceClient;
use crate::table::RecordTable;

use super::parser::Parser;

/// Bucket and key of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAddress {
    pub bucket: String,
    pub key: String,
    pub region: Option<String>,
}

impl ObjectAddress {
    /// Parse `s3://bucket/key` or `https://bucket.s3[.region].amazonaws.com/key`.
    pub fn parse(address: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            CentralisError::Config(format!("Invalid object address '{}': {}", address, reason))
        };

        if let Some(rest) = address.strip_prefix("s3://") {
            let (bucket, key) = rest.split_once('/').ok_or_else(|| invalid("missing key"))?;
            if bucket.is_empty() || key.is_empty() {
                return Err(invalid("empty bucket or key"));
            }
            return Ok(Self {
                bucket: bucket.to_string(),
                key: key.to_string(),
                region: None,
            });
        }

        let url = Url::parse(address).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "https" {
            return Err(invalid("expected s3:// or https://"));
        }
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let (bucket, endpoint) = host
            .split_once(".s3")
            .ok_or_else(|| invalid("host is not an S3 endpoint"))?;
        let region = endpoint
            .strip_suffix(".amazonaws.com")
            .ok_or_else(|| invalid("host is not an S3 endpoint"))?
            .trim_start_matches(['.', '-'])
            .to_string();

        let key = url.path().trim_start_matches('/');
        if bucket.is_empty() || key.is_empty() {
            return Err(invalid("empty bucket or key"));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            region: (!region.is_empty()).then_some(region),
        })
    }

    /// Virtual-hosted HTTPS URL of the object.
    pub fn https_url(&self) -> String {
        match &self.region {
            Some(region) => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, region, self.key
            ),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, self.key),
        }
    }

    fn is_json(&self) -> bool {
        self.key.to_lowercase().ends_with(".json")
    }
}

impl FromStr for ObjectAddress {
    type Err = CentralisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Reads objects through their public HTTPS endpoint.
pub struct HttpObjectStore {
    client: Arc<dyn ResourceClient>,
    parser: Parser,
}

impl HttpObjectStore {
    pub fn new(client: Arc<dyn ResourceClient>, parser: Parser) -> Self {
        Self { client, parser }
    }

    /// Fetch an object as a raw table. `.json` keys are decoded as JSON,
    /// everything else as delimited text.
    pub async fn get_table(&self, address: &ObjectAddress) -> Result<RecordTable> {
        let url = address.https_url();
        let table = if address.is_json() {
            let body = self.client.get_json(&url).await?;
            RecordTable::from_json(&body)?
        } else {
            let bytes = self.client.get_bytes(&url).await?;
            self.parser.parse_bytes(&bytes)?
        };
        tracing::info!(object = %address, rows = table.row_count(), "Read object");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_s3_uri() {
        let address = ObjectAddress::parse("s3://data-handling-public/products.csv").unwrap();
        assert_eq!(address.bucket, "data-handling-public");
        assert_eq!(address.key, "products.csv");
        assert_eq!(
            address.https_url(),
            "https://data-handling-public.s3.amazonaws.com/products.csv"
        );
    }

    #[test]
    fn test_parse_regional_https_url() {
        let address = ObjectAddress::parse(
            "https://data-handling-public.s3.eu-west-1.amazonaws.com/date_details.json",
        )
        .unwrap();
        assert_eq!(address.bucket, "data-handling-public");
        assert_eq!(address.region.as_deref(), Some("eu-west-1"));
        assert_eq!(address.key, "date_details.json");
        assert!(address.is_json());
    }

    #[test]
    fn test_rejects_non_s3_addresses() {
        assert!(ObjectAddress::parse("s3://bucket-only").is_err());
        assert!(ObjectAddress::parse("https://example.com/file.csv").is_err());
        assert!(ObjectAddress::parse("ftp://bucket/key").is_err());
    }
}
