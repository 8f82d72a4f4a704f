//! External fetch clients.
//!
//! Each client performs one outbound HTTP call per operation, decodes the
//! JSON body into a typed result and classifies failures as a
//! [`FetchError`]. The dispatcher only sees the [`QuestionSource`] and
//! [`QuoteSource`] traits, so handlers can be exercised without a network.

pub mod finnhub;
pub mod leetcode;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::Config;
use crate::error::FetchError;

pub use finnhub::{CompanyProfile, FinnhubClient, Quote};
pub use leetcode::{DailyQuestion, LeetCodeClient};

/// Per-request timeout applied by every fetch client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the daily coding challenge.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch_daily_question(&self) -> Result<DailyQuestion, FetchError>;
}

/// Source of stock quotes and optional company profiles.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, FetchError>;

    /// Best-effort enrichment; callers are free to discard the error.
    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, FetchError>;
}

/// Build the HTTP client shared by the fetch clients.
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("feedbot/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build configured HTTP client, using defaults: {}", e);
            Client::new()
        })
}

/// Build both fetch clients from configuration, sharing one HTTP client.
pub fn clients_from_config(config: &Config) -> (Arc<LeetCodeClient>, Arc<FinnhubClient>) {
    let timeout = config.timeout();
    let client = http_client(timeout);

    let leetcode = LeetCodeClient::new(client.clone(), &config.feeds.leetcode.graphql_url, timeout);
    let finnhub = FinnhubClient::new(
        client,
        &config.feeds.finnhub.api_base,
        &config.feeds.finnhub.api_key,
        timeout,
    );
    (Arc::new(leetcode), Arc::new(finnhub))
}

/// Reject anything but `200 OK` before touching the body, then decode it.
async fn decode_json<T: DeserializeOwned>(
    response: Response,
    timeout: Duration,
) -> Result<T, FetchError> {
    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::from_transport(e, timeout))?;

    Ok(serde_json::from_str(&body)?)
}
