use crate::{models::QuoteRecord, Result};

/// Trait for quote providers - makes testing easier and keeps things flexible
///
/// Each upstream API (FavQs, ZenQuotes) implements this trait. The
/// service never sees wire formats, only normalized records, so we can
/// swap providers without breaking everything.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch up to `count` fresh quotes
    ///
    /// Implementations drop malformed records rather than failing the
    /// batch, so the result may be shorter than asked for.
    async fn fetch_quotes(&self, count: usize) -> Result<Vec<QuoteRecord>>;

    /// Fetch the provider's quote of the day
    async fn quote_of_the_day(&self) -> Result<QuoteRecord>;

    /// Human-readable provider name, for logs
    fn name(&self) -> &'static str;
}
