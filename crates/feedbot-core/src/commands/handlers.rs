//! Built-in command handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::CommandHandler;
use crate::error::FetchError;
use crate::feeds::{QuestionSource, QuoteSource};
use crate::format::{format_question_on, format_quote, today};

pub const MISSING_SYMBOL_TEXT: &str = "Please provide a stock symbol. Usage: !s AAPL";

/// Replies with fixed text (`/start`, `/help`).
pub struct StaticReplyHandler {
    name: String,
    text: String,
}

impl StaticReplyHandler {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl CommandHandler for StaticReplyHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, _args: &str) -> String {
        self.text.clone()
    }
}

/// Fetches and renders the daily coding challenge.
pub struct DailyQuestionHandler {
    source: Arc<dyn QuestionSource>,
    site_url: String,
}

impl DailyQuestionHandler {
    pub fn new(source: Arc<dyn QuestionSource>, site_url: impl Into<String>) -> Self {
        Self {
            source,
            site_url: site_url.into(),
        }
    }
}

#[async_trait]
impl CommandHandler for DailyQuestionHandler {
    fn name(&self) -> &str {
        "daily_question"
    }

    async fn handle(&self, _args: &str) -> String {
        match self.source.fetch_daily_question().await {
            Ok(question) => {
                info!(slug = %question.title_slug, "Served daily question");
                format_question_on(&question, today(), &self.site_url)
            }
            Err(e) => {
                warn!(error = %e, "Daily question unavailable");
                format!("Failed to fetch LeetCode daily question: {}", e)
            }
        }
    }
}

/// Fetches a quote for the symbol argument, enriched with the company
/// profile when that second call succeeds.
pub struct StockQuoteHandler {
    source: Arc<dyn QuoteSource>,
}

impl StockQuoteHandler {
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self { source }
    }
}

/// Trim and uppercase a symbol argument.
pub fn normalize_symbol(args: &str) -> Result<String, FetchError> {
    let symbol = args.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(FetchError::Validation("missing stock symbol".into()));
    }
    Ok(symbol)
}

#[async_trait]
impl CommandHandler for StockQuoteHandler {
    fn name(&self) -> &str {
        "stock_quote"
    }

    async fn handle(&self, args: &str) -> String {
        let Ok(symbol) = normalize_symbol(args) else {
            return MISSING_SYMBOL_TEXT.into();
        };

        let quote = match self.source.fetch_quote(&symbol).await {
            Ok(q) => q,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Quote unavailable");
                return format!("Failed to fetch stock quote: {}", e);
            }
        };

        let profile = self
            .source
            .fetch_profile(&symbol)
            .await
            .inspect_err(|e| debug!(symbol = %symbol, error = %e, "Profile skipped"))
            .ok();

        info!(symbol = %symbol, price = quote.current, "Served stock quote");
        format_quote(&symbol, &quote, profile.as_ref())
    }
}
