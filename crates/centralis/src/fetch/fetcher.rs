//! Fixed worker pool fetch with retry and completion-order aggregation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Map, Value as JsonValue};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::{CentralisError, Result};
use crate::table::RecordTable;

use super::client::{FetchError, ResourceClient};

/// Placeholder in URL templates replaced by the resource index.
const INDEX_SLOT: &str = "{}";

/// Field of the count endpoint holding the number of resources.
const COUNT_FIELD: &str = "number_stores";

/// Retry schedule for transient request failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    /// Sleep before the first retry.
    pub base_delay: Duration,
    /// Factor applied to the delay after every retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay slept after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        self.base_delay.mul_f64(self.multiplier.max(0.0).powi(exponent))
    }
}

/// Whether resource indices start at zero or one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexBase {
    #[default]
    Zero,
    One,
}

impl IndexBase {
    fn offset(self) -> usize {
        match self {
            IndexBase::Zero => 0,
            IndexBase::One => 1,
        }
    }
}

/// Configuration for batch fetches.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Number of pool workers, and so the maximum requests in flight.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub index_base: IndexBase,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            retry: RetryPolicy::default(),
            index_base: IndexBase::Zero,
        }
    }
}

/// A request abandoned after its retries ran out or a permanent failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub index: usize,
    pub url: String,
    /// Attempts made before giving up.
    pub attempts: u32,
    pub error: FetchError,
}

/// Result of a batch fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// At least one request succeeded (or none were needed).
    Fetched {
        /// Records in completion order.
        table: RecordTable,
        failures: Vec<FetchFailure>,
    },
    /// Every request failed.
    AllFailed { failures: Vec<FetchFailure> },
}

impl FetchOutcome {
    pub fn is_all_failed(&self) -> bool {
        matches!(self, FetchOutcome::AllFailed { .. })
    }

    pub fn failures(&self) -> &[FetchFailure] {
        match self {
            FetchOutcome::Fetched { failures, .. } | FetchOutcome::AllFailed { failures } => {
                failures
            }
        }
    }

    /// The fetched table, or [`CentralisError::AllFetchesFailed`].
    pub fn into_table(self) -> Result<RecordTable> {
        match self {
            FetchOutcome::Fetched { table, .. } => Ok(table),
            FetchOutcome::AllFailed { failures } => Err(CentralisError::AllFetchesFailed {
                attempted: failures.len(),
            }),
        }
    }
}

/// Substitute `index` into the template's slot.
pub fn fill_template(template: &str, index: usize) -> String {
    template.replacen(INDEX_SLOT, &index.to_string(), 1)
}

/// Fetches numbered resources through a [`ResourceClient`].
pub struct Fetcher<C> {
    client: Arc<C>,
    config: FetchConfig,
}

impl<C: ResourceClient + 'static> Fetcher<C> {
    pub fn new(client: C, config: FetchConfig) -> Self {
        Self::with_shared_client(Arc::new(client), config)
    }

    pub fn with_shared_client(client: Arc<C>, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Read the number of available resources from a count endpoint.
    pub async fn fetch_count(&self, url: &str) -> Result<usize> {
        let body = fetch_with_retry(self.client.as_ref(), url, &self.config.retry)
            .await
            .map_err(|(_, e)| CentralisError::Fetch(e))?;

        let count = body
            .get(COUNT_FIELD)
            .and_then(JsonValue::as_u64)
            .ok_or_else(|| {
                CentralisError::UnexpectedResponse(format!(
                    "'{}' from {} is not a non-negative integer",
                    COUNT_FIELD, url
                ))
            })?;
        tracing::info!(url, count, "Resource count");
        Ok(count as usize)
    }

    /// Fetch `count` resources from `template`, one record each.
    ///
    /// Abandoned requests are reported in the outcome and never fail their
    /// siblings. Only a panicked worker or a malformed template is an `Err`.
    pub async fn fetch_all(&self, template: &str, count: usize) -> Result<FetchOutcome> {
        if !template.contains(INDEX_SLOT) {
            return Err(CentralisError::Config(format!(
                "URL template '{}' has no '{}' slot",
                template, INDEX_SLOT
            )));
        }

        let concurrency = self.config.concurrency.max(1);
        let pool_size = concurrency.min(count);
        tracing::info!(template, count, concurrency, "Starting batch fetch");

        // Workers claim positions from a shared counter until it passes `count`.
        let next = Arc::new(AtomicUsize::new(0));
        let template: Arc<str> = Arc::from(template);
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();

        for _ in 0..pool_size {
            let next = Arc::clone(&next);
            let template = Arc::clone(&template);
            let client = Arc::clone(&self.client);
            let retry = self.config.retry.clone();
            let offset = self.config.index_base.offset();
            let sender = sender.clone();

            workers.spawn(async move {
                loop {
                    let position = next.fetch_add(1, Ordering::Relaxed);
                    if position >= count {
                        break;
                    }
                    let index = position + offset;
                    let url = fill_template(&template, index);
                    let result = fetch_with_retry(client.as_ref(), &url, &retry)
                        .await
                        .map_err(|(attempts, error)| FetchFailure {
                            index,
                            url,
                            attempts,
                            error,
                        });
                    if sender.send(result).is_err() {
                        break;
                    }
                }
            });
        }
        drop(sender);

        let mut records = Vec::with_capacity(count);
        let mut failures = Vec::new();

        while let Some(result) = receiver.recv().await {
            match result {
                Ok(record) => records.push(record),
                Err(failure) => {
                    tracing::warn!(
                        index = failure.index,
                        attempts = failure.attempts,
                        error = %failure.error,
                        "Abandoned request"
                    );
                    failures.push(failure);
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            joined.map_err(|e| CentralisError::Worker(e.to_string()))?;
        }

        tracing::info!(
            fetched = records.len(),
            failed = failures.len(),
            "Batch fetch finished"
        );

        if records.is_empty() && !failures.is_empty() {
            return Ok(FetchOutcome::AllFailed { failures });
        }

        Ok(FetchOutcome::Fetched {
            table: RecordTable::from_json_records(&records),
            failures,
        })
    }
}

/// Fetch one JSON object, retrying transient failures. On failure returns
/// the attempts made and the last error.
async fn fetch_with_retry<C: ResourceClient + ?Sized>(
    client: &C,
    url: &str,
    policy: &RetryPolicy,
) -> std::result::Result<Map<String, JsonValue>, (u32, FetchError)> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = client.get_json(url).await.and_then(|body| match body {
            JsonValue::Object(record) => Ok(record),
            other => Err(FetchError::Body {
                url: url.to_string(),
                message: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        });

        match result {
            Ok(record) => return Ok(record),
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    url,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Retrying request"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err((attempt, error)),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
