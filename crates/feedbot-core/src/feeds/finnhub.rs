//! Stock quotes and company profiles from the Finnhub REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use super::{decode_json, QuoteSource};
use crate::error::FetchError;

pub const FINNHUB_API_BASE: &str = "https://finnhub.io/api/v1";

/// Name reported when the API key is missing.
const API_KEY_NAME: &str = "FINNHUB_API_KEY";

/// Latest quote for a symbol.
///
/// Finnhub answers unknown symbols with a zero-filled object (sometimes with
/// `null` in place of numbers) instead of an HTTP error, so every field
/// decodes missing or `null` values as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Quote {
    #[serde(rename = "c", default, deserialize_with = "null_as_zero")]
    pub current: f64,
    #[serde(rename = "d", default, deserialize_with = "null_as_zero")]
    pub change: f64,
    #[serde(rename = "dp", default, deserialize_with = "null_as_zero")]
    pub percent_change: f64,
    #[serde(rename = "h", default, deserialize_with = "null_as_zero")]
    pub high: f64,
    #[serde(rename = "l", default, deserialize_with = "null_as_zero")]
    pub low: f64,
    #[serde(rename = "o", default, deserialize_with = "null_as_zero")]
    pub open: f64,
    #[serde(rename = "pc", default, deserialize_with = "null_as_zero")]
    pub previous_close: f64,
}

/// Optional enrichment shown under a quote. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyProfile {
    pub name: String,
    /// In millions of the listing currency.
    #[serde(deserialize_with = "null_as_zero")]
    pub market_capitalization: f64,
    #[serde(rename = "finnhubIndustry")]
    pub industry: String,
    pub exchange: String,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

pub struct FinnhubClient {
    client: Client,
    api_base: String,
    api_key: String,
    timeout: Duration,
}

impl FinnhubClient {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            timeout,
        }
    }

    /// Whether a key is present. Requests without one fail per call.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Fetch the current quote. A zero current price means "not found".
    pub async fn fetch_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        let quote: Quote = self.get("quote", symbol).await?;

        if quote.current == 0.0 {
            debug!(symbol, "Finnhub returned an empty quote");
            return Err(FetchError::NotFound(symbol.to_owned()));
        }

        Ok(quote)
    }

    /// Fetch the company profile. Unknown symbols yield an empty profile.
    pub async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, FetchError> {
        self.get("stock/profile2", symbol).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        symbol: &str,
    ) -> Result<T, FetchError> {
        if !self.has_api_key() {
            return Err(FetchError::Configuration(API_KEY_NAME.into()));
        }

        let url = format!("{}/{}", self.api_base, path);
        debug!(path, symbol, "Requesting Finnhub");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::from_transport(e, self.timeout))?;

        decode_json(response, self.timeout)
            .await
            .inspect_err(|e| warn!(path, symbol, error = %e, "Finnhub request failed"))
    }
}

#[async_trait]
impl QuoteSource for FinnhubClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        FinnhubClient::fetch_quote(self, symbol).await
    }

    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, FetchError> {
        FinnhubClient::fetch_profile(self, symbol).await
    }
}
