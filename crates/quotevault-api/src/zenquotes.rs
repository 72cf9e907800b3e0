use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::{is_retryable_status, with_retry_if, RetryConfig};

const ZENQUOTES_API_BASE: &str = "https://zenquotes.io/api";

#[derive(Error, Debug)]
pub enum ZenQuotesError {
    /// Terminal request failure (4xx and friends)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Upstream 5xx - worth retrying
    #[error("Upstream server error: {0}")]
    ServerError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Empty response from API")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl ZenQuotesError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ZenQuotesError::ServerError(_)
                | ZenQuotesError::RateLimitExceeded
                | ZenQuotesError::NetworkError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ZenQuotesError>;

/// Client for the ZenQuotes API
///
/// The /quotes endpoint returns 50 quotes per call, no auth needed.
/// ZenQuotes does not assign quote ids, so callers derive one from the
/// quote content.
pub struct ZenQuotesClient {
    client: reqwest::Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl ZenQuotesClient {
    pub fn new() -> Self {
        Self::with_base_url(ZENQUOTES_API_BASE.to_string())
    }

    /// Mainly useful for pointing tests at a local stub server
    pub fn with_base_url(base_url: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("QuoteVault/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        // ZenQuotes is noticeably slower than FavQs, give it more room
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            retry_config: RetryConfig::default(),
        }
    }

    /// Create client with custom retry configuration
    pub fn with_retry_config(retry_config: RetryConfig) -> Self {
        let mut client = Self::new();
        client.retry_config = retry_config;
        client
    }

    /// Fetch a batch of random quotes
    ///
    /// The endpoint always returns its full page; truncation to `count`
    /// happens here so callers get at most what they asked for.
    pub async fn fetch_batch(&self, count: usize) -> Result<Vec<ZenQuote>> {
        let url = format!("{}/quotes", self.base_url);

        let mut quotes = with_retry_if(
            &self.retry_config,
            || async {
                let response = self.client.get(&url).send().await?;

                if response.status() == 429 {
                    return Err(ZenQuotesError::RateLimitExceeded);
                }

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();

                    if is_retryable_status(status) {
                        return Err(ZenQuotesError::ServerError(format!(
                            "Status {}: {}",
                            status, body
                        )));
                    }

                    return Err(ZenQuotesError::RequestFailed(format!(
                        "Status {}: {}",
                        status, body
                    )));
                }

                let quotes: Vec<ZenQuote> = response.json().await?;

                if quotes.is_empty() {
                    return Err(ZenQuotesError::EmptyResponse);
                }

                Ok(quotes)
            },
            ZenQuotesError::is_retryable,
        )
        .await?;

        if count < quotes.len() {
            quotes.truncate(count);
        }

        tracing::debug!("Fetched {} quotes from ZenQuotes", quotes.len());
        Ok(quotes)
    }
}

impl Default for ZenQuotesClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A single quote as ZenQuotes serves it
///
/// `q` is the quote text, `a` the author. There is no id field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZenQuote {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub a: String,
}
