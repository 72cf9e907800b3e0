use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::{is_retryable_status, with_retry_if, RetryConfig};

const FAVQS_API_BASE: &str = "https://favqs.com/api";

#[derive(Error, Debug)]
pub enum FavQsError {
    /// Terminal request failure (4xx and friends)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Upstream 5xx - worth retrying
    #[error("Upstream server error: {0}")]
    ServerError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Authentication required")]
    AuthRequired,

    #[error("Quote payload missing required fields")]
    InvalidQuote,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl FavQsError {
    /// Whether another attempt could plausibly succeed
    ///
    /// Server hiccups, rate limits and network failures are transient;
    /// auth failures and malformed payloads are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FavQsError::ServerError(_)
                | FavQsError::RateLimitExceeded
                | FavQsError::NetworkError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FavQsError>;

/// Client for the FavQs quote API
///
/// FavQs only hands out one quote per request on the qotd endpoint,
/// so batches are assembled by polling it repeatedly.
pub struct FavQsClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    retry_config: RetryConfig,
}

impl FavQsClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, FAVQS_API_BASE.to_string())
    }

    /// Mainly useful for pointing tests at a local stub server
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("QuoteVault/0.1.0"),
        );
        // FavQs aggressively caches qotd responses without this
        headers.insert(
            reqwest::header::CACHE_CONTROL,
            reqwest::header::HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(5))
            .connect_timeout(std::time::Duration::from_secs(3))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url,
            retry_config: RetryConfig::default(),
        }
    }

    /// Create client with custom retry configuration
    pub fn with_retry_config(api_key: Option<String>, retry_config: RetryConfig) -> Self {
        let mut client = Self::new(api_key);
        client.retry_config = retry_config;
        client
    }

    /// Fetch the quote of the day
    pub async fn quote_of_the_day(&self) -> Result<FavQsQuote> {
        let url = format!("{}/qotd", self.base_url);
        let api_key = self.api_key.clone();

        // Wrap in retry logic, skipping retries on terminal errors
        with_retry_if(
            &self.retry_config,
            || async {
                let mut request = self.client.get(&url);

                if let Some(ref key) = api_key {
                    request = request.header(
                        reqwest::header::AUTHORIZATION,
                        format!("Token token=\"{}\"", key),
                    );
                }

                let response = request.send().await?;

                if response.status() == 401 {
                    return Err(FavQsError::AuthRequired);
                }

                if response.status() == 429 {
                    return Err(FavQsError::RateLimitExceeded);
                }

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();

                    if is_retryable_status(status) {
                        return Err(FavQsError::ServerError(format!(
                            "Status {}: {}",
                            status, body
                        )));
                    }

                    return Err(FavQsError::RequestFailed(format!(
                        "Status {}: {}",
                        status, body
                    )));
                }

                let envelope: FavQsQotdResponse = response.json().await?;
                let quote = envelope.quote;

                if quote.body.trim().is_empty() || quote.author.trim().is_empty() {
                    return Err(FavQsError::InvalidQuote);
                }

                Ok(quote)
            },
            FavQsError::is_retryable,
        )
        .await
    }

    /// Assemble a batch of quotes by polling the qotd endpoint
    ///
    /// Individual failures are logged and skipped; the whole batch only
    /// fails when not a single quote came back.
    pub async fn fetch_batch(&self, count: usize) -> Result<Vec<FavQsQuote>> {
        let mut quotes = Vec::with_capacity(count);
        let mut last_error = None;

        for i in 0..count {
            match self.quote_of_the_day().await {
                Ok(quote) => quotes.push(quote),
                Err(e) => {
                    tracing::warn!("Failed to fetch quote {}/{}: {}", i + 1, count, e);
                    last_error = Some(e);
                }
            }
        }

        if quotes.is_empty() {
            return Err(
                last_error.unwrap_or_else(|| FavQsError::RequestFailed("empty batch".into()))
            );
        }

        tracing::debug!("Fetched {}/{} quotes from FavQs", quotes.len(), count);
        Ok(quotes)
    }
}

/// Envelope around the qotd endpoint payload
#[derive(Debug, Clone, Deserialize)]
struct FavQsQotdResponse {
    quote: FavQsQuote,
}

/// A single quote as FavQs serves it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavQsQuote {
    /// FavQs quote ids are numeric and stable across requests
    pub id: Option<i64>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qotd_payload_parses() {
        let payload = r#"{
            "qotd_date": "2025-05-19T00:00:00.000+00:00",
            "quote": {
                "id": 4,
                "body": "Simplicity is the ultimate sophistication.",
                "author": "Leonardo da Vinci",
                "favorites_count": 12
            }
        }"#;

        let envelope: FavQsQotdResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(envelope.quote.id, Some(4));
        assert_eq!(envelope.quote.author, "Leonardo da Vinci");
    }

    #[test]
    fn test_retryability_by_error_kind() {
        assert!(FavQsError::ServerError("Status 503".into()).is_retryable());
        assert!(FavQsError::RateLimitExceeded.is_retryable());

        assert!(!FavQsError::AuthRequired.is_retryable());
        assert!(!FavQsError::InvalidQuote.is_retryable());
        assert!(!FavQsError::RequestFailed("Status 404".into()).is_retryable());
    }

    #[test]
    fn test_qotd_payload_without_id() {
        // FavQs always sends ids in practice, but the deserializer
        // shouldn't fall over if one goes missing
        let payload = r#"{"quote": {"body": "b", "author": "a"}}"#;
        let envelope: FavQsQotdResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(envelope.quote.id, None);
        assert_eq!(envelope.quote.body, "b");
    }
}
