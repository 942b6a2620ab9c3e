//! Concurrent retrieval of numbered resources from an HTTP API.
//!
//! A [`Fetcher`] expands a URL template over an index range, runs the
//! requests on a bounded pool of tokio tasks, retries transient failures with
//! exponential backoff and gathers the surviving records in completion order.

mod client;
mod fetcher;

pub use client::{FetchError, HttpClient, ResourceClient};
pub use fetcher::{
    FetchConfig, FetchFailure, FetchOutcome, Fetcher, IndexBase, RetryPolicy, fill_template,
};
