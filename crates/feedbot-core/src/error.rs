//! Error taxonomy for the external feed clients.
//!
//! Every fetch client returns a [`FetchError`]. Command handlers render it
//! through `Display` into the failure reply, so the messages below are
//! written for chat users rather than for logs.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single outbound fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    /// A required secret (e.g. the quote provider API key) is missing.
    #[error("{0} not configured")]
    Configuration(String),

    /// The endpoint could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the client timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered with a status other than 200.
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),

    /// The body did not match the expected JSON shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Well-formed response that carries no data for the requested symbol.
    #[error("symbol {0} not found or no data available")]
    NotFound(String),

    /// Malformed user-supplied argument.
    #[error("invalid input: {0}")]
    Validation(String),
}

impl FetchError {
    /// Classify a transport error, keeping timeouts distinct.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Network(err.without_url().to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
