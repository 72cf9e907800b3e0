// FavQs adapter - bridges the API client with the QuoteProvider trait
use async_trait::async_trait;
use tracing::warn;

use quotevault_api::{FavQsClient, FavQsQuote};

use crate::{models::QuoteRecord, provider::QuoteProvider, Error, Result};

/// Wrapper around FavQsClient that implements QuoteProvider
pub struct FavQsProvider {
    client: FavQsClient,
}

impl FavQsProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: FavQsClient::new(api_key),
        }
    }

    pub fn with_client(client: FavQsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuoteProvider for FavQsProvider {
    async fn fetch_quotes(&self, count: usize) -> Result<Vec<QuoteRecord>> {
        let quotes = self
            .client
            .fetch_batch(count)
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        Ok(quotes.into_iter().filter_map(favqs_to_record).collect())
    }

    async fn quote_of_the_day(&self) -> Result<QuoteRecord> {
        let quote = self
            .client
            .quote_of_the_day()
            .await
            .map_err(|e| Error::ProviderUnavailable(e.to_string()))?;

        favqs_to_record(quote)
            .ok_or_else(|| Error::InvalidQuoteData("qotd missing body or author".into()))
    }

    fn name(&self) -> &'static str {
        "favqs"
    }
}

/// Convert a FavQs wire quote to our internal record
///
/// Malformed entries are logged and dropped, not fatal to the batch.
fn favqs_to_record(quote: FavQsQuote) -> Option<QuoteRecord> {
    let id = quote.id.map(|id| id.to_string());
    match QuoteRecord::normalize(id, quote.body, quote.author) {
        Some(record) => Some(record),
        None => {
            warn!("Skipping FavQs quote with missing body or author");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_becomes_string() {
        let record = favqs_to_record(FavQsQuote {
            id: Some(42),
            body: "b".into(),
            author: "a".into(),
        })
        .unwrap();
        assert_eq!(record.external_id, "42");
    }

    #[test]
    fn test_malformed_quote_is_dropped() {
        assert!(favqs_to_record(FavQsQuote {
            id: Some(1),
            body: "".into(),
            author: "a".into(),
        })
        .is_none());
    }
}
