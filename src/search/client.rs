//! Remote search API client and outcome classification.
//!
//! One bounded query per call; the HTTP status drives a four-way outcome
//! split that the scorer consumes. Sleeping and backoff are deliberately the
//! caller's responsibility so the executor stays a pure request/classify
//! wrapper.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::config::ApiConfig;
use crate::core::errors::{CallsiftError, Result};

/// Result of one remote query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The query succeeded; `count` is the reported total match count.
    Ok {
        /// Total match count from the response body
        count: u64,
    },

    /// The API throttled the request (HTTP 403). Retryable after backoff.
    RateLimited,

    /// The query was rejected as too complex (HTTP 422). Permanent zero for
    /// the group, never retried.
    ClientError {
        /// The rejecting status code
        status: u16,
    },

    /// Any other failure. Treated as a zero for the group, never retried.
    TransientError {
        /// The status code, or 0 when the request never completed
        status: u16,
    },
}

impl QueryOutcome {
    /// Classify an HTTP status plus an optionally-parsed match count.
    pub fn from_status(status: u16, count: Option<u64>) -> Self {
        match status {
            200 => match count {
                Some(count) => Self::Ok { count },
                // 200 with an unreadable body is a malformed response, not a
                // success with zero matches
                None => Self::TransientError { status: 200 },
            },
            403 => Self::RateLimited,
            422 => Self::ClientError { status },
            other => Self::TransientError { status: other },
        }
    }
}

/// Seam between the scorer and the network.
///
/// The production implementation is [`SearchClient`]; tests substitute a
/// scripted backend so retry and pacing semantics can be exercised without a
/// remote API.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute one bounded search query and classify the outcome.
    ///
    /// Transport failures (connection refused, timeout) fold into
    /// [`QueryOutcome::TransientError`] with status 0; per-group zeroes are
    /// the crawler's accepted approximation for "could not check".
    async fn execute(&self, query: &str) -> QueryOutcome;
}

#[derive(Debug, Deserialize)]
struct CodeSearchResponse {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct RepositorySearchResponse {
    #[serde(default)]
    items: Vec<RepositoryItem>,
}

#[derive(Debug, Deserialize)]
struct RepositoryItem {
    full_name: String,
}

/// Authenticated client for the GitHub search API.
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SearchClient {
    /// Build a client from API settings, resolving the access token.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let token = config.resolved_token()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("callsift/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Fetch the candidate repository set (full names, popularity order).
    ///
    /// Unlike per-group scoring queries, a failure here is surfaced to the
    /// caller: with no candidates there is no run to continue.
    pub async fn search_repositories(&self, query: &str, per_page: u32) -> Result<Vec<String>> {
        let url = format!("{}/search/repositories", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("token {}", self.token))
            .query(&[
                ("q", query),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", &per_page.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallsiftError::search_with_status(
                format!("repository search failed: {body}"),
                status.as_u16(),
            ));
        }

        let parsed: RepositorySearchResponse = response.json().await?;
        Ok(parsed.items.into_iter().map(|item| item.full_name).collect())
    }
}

#[async_trait]
impl SearchBackend for SearchClient {
    async fn execute(&self, query: &str) -> QueryOutcome {
        let url = format!("{}/search/code", self.base_url);
        // .query() URL-encodes the composite pattern+scope string exactly once
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("token {}", self.token))
            .query(&[("q", query), ("per_page", "1")])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!("search request failed before a status was received: {err}");
                return QueryOutcome::TransientError { status: 0 };
            }
        };

        let status = response.status().as_u16();
        let count = if status == 200 {
            match response.json::<CodeSearchResponse>().await {
                Ok(body) => Some(body.total_count),
                Err(err) => {
                    warn!("malformed search response body: {err}");
                    None
                }
            }
        } else {
            None
        };

        let outcome = QueryOutcome::from_status(status, count);
        debug!(status, ?outcome, "classified search response");
        outcome
    }
}
