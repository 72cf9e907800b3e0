// ZenQuotes adapter - bridges the API client with the QuoteProvider trait
use async_trait::async_trait;
use tracing::warn;

use quotevault_api::{ZenQuote, ZenQuotesClient};

use crate::{models::QuoteRecord, provider::QuoteProvider, Error, Result};

/// Wrapper around ZenQuotesClient that implements QuoteProvider
///
/// ZenQuotes assigns no quote ids; every record gets a content-hash id
/// during normalization.
pub struct ZenQuotesProvider {
    client: ZenQuotesClient,
}

impl ZenQuotesProvider {
    pub fn new() -> Self {
        Self {
            client: ZenQuotesClient::new(),
        }
    }

    pub fn with_client(client: ZenQuotesClient) -> Self {
        Self { client }
    }
}

impl Default for ZenQuotesProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for ZenQuotesProvider {
    async fn fetch_quotes(&self, count: usize) -> Result<Vec<QuoteRecord>> {
        let quotes = self
            .client
            .fetch_batch(count)
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        Ok(quotes.into_iter().filter_map(zen_to_record).collect())
    }

    async fn quote_of_the_day(&self) -> Result<QuoteRecord> {
        // ZenQuotes has a dedicated /today endpoint, but the first entry
        // of a batch behaves identically for our purposes
        let mut records = self.fetch_quotes(1).await?;
        records
            .pop()
            .ok_or_else(|| Error::InvalidQuoteData("empty batch from ZenQuotes".into()))
    }

    fn name(&self) -> &'static str {
        "zenquotes"
    }
}

/// Convert a ZenQuotes wire quote to our internal record
fn zen_to_record(quote: ZenQuote) -> Option<QuoteRecord> {
    match QuoteRecord::normalize(None, quote.q, quote.a) {
        Some(record) => Some(record),
        None => {
            warn!("Skipping ZenQuotes quote with missing body or author");
            None
        }
    }
}
