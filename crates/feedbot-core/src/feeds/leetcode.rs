//! LeetCode daily challenge via the public GraphQL endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{decode_json, QuestionSource};
use crate::error::FetchError;

pub const LEETCODE_GRAPHQL_URL: &str = "https://leetcode.com/graphql";

const DAILY_QUESTION_QUERY: &str = "{
    activeDailyCodingChallengeQuestion {
        question {
            title
            titleSlug
            difficulty
        }
    }
}";

/// The active daily coding challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DailyQuestion {
    pub title: String,
    pub title_slug: String,
    /// Free-form upstream label, usually "Easy", "Medium" or "Hard".
    pub difficulty: String,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GraphQlResponse {
    data: Option<DailyData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DailyData {
    active_daily_coding_challenge_question: Option<ActiveChallenge>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ActiveChallenge {
    question: Option<DailyQuestion>,
}

pub struct LeetCodeClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl LeetCodeClient {
    pub fn new(client: Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// POST the fixed daily-challenge query and extract the nested question.
    pub async fn fetch_daily_question(&self) -> Result<DailyQuestion, FetchError> {
        debug!(endpoint = %self.endpoint, "Fetching LeetCode daily question");

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&GraphQlRequest {
                query: DAILY_QUESTION_QUERY,
            })
            .send()
            .await
            .map_err(|e| FetchError::from_transport(e, self.timeout))?;

        let decoded: GraphQlResponse = decode_json(response, self.timeout)
            .await
            .inspect_err(|e| error!(error = %e, "LeetCode daily question request failed"))?;

        Ok(decoded
            .data
            .and_then(|d| d.active_daily_coding_challenge_question)
            .and_then(|a| a.question)
            .unwrap_or_default())
    }
}

#[async_trait]
impl QuestionSource for LeetCodeClient {
    async fn fetch_daily_question(&self) -> Result<DailyQuestion, FetchError> {
        LeetCodeClient::fetch_daily_question(self).await
    }
}
