// The quote cache service: pool-first reads with a per-user favorite overlay
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{debug, info, warn};

use quotevault_cache::CacheBackend;
use quotevault_store::QuoteStore;

use crate::{
    keys,
    models::{CachedQuote, QuoteRecord},
    provider::QuoteProvider,
    Error, Result,
};

const DEFAULT_POOL_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_FAVORITE_TTL: Duration = Duration::from_secs(300);

/// Serves batches of quotes cheaply, refilling from the provider when
/// the pool runs dry, and stamps each quote with the requesting user's
/// favorite status
///
/// All collaborators are injected: the provider behind a trait, the
/// cache behind a trait, the store behind an Arc. Nothing here reaches
/// into process-wide state, which is what keeps the whole thing
/// testable.
pub struct QuoteService {
    provider: Box<dyn QuoteProvider>,
    store: Arc<QuoteStore>,
    cache: Arc<dyn CacheBackend>,
    pool_ttl: Duration,
    favorite_ttl: Duration,
}

impl QuoteService {
    pub fn new(
        provider: Box<dyn QuoteProvider>,
        store: Arc<QuoteStore>,
        cache: Arc<dyn CacheBackend>,
    ) -> Self {
        Self {
            provider,
            store,
            cache,
            pool_ttl: DEFAULT_POOL_TTL,
            favorite_ttl: DEFAULT_FAVORITE_TTL,
        }
    }

    /// Override the default TTLs (from config)
    pub fn with_ttls(mut self, pool_ttl: Duration, favorite_ttl: Duration) -> Self {
        self.pool_ttl = pool_ttl;
        self.favorite_ttl = favorite_ttl;
        self
    }

    /// Get `count` quotes annotated with `user_id`'s favorite status
    ///
    /// Pool-first: a sufficiently stocked pool never touches the
    /// provider. An under-supplied pool triggers a provider fetch whose
    /// results are persisted and pooled before being returned. If the
    /// provider is down, whatever the pool holds is returned instead of
    /// an error; only an empty pool plus a dead provider is fatal.
    pub async fn get_quotes(&self, count: usize, user_id: i64) -> Result<Vec<CachedQuote>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let pooled = self.pool_records();

        if pooled.len() >= count {
            debug!("Serving {} quotes from pool", count);
            return self.annotate(&pooled[..count], user_id);
        }

        debug!(
            "Pool under-supplied ({}/{}), fetching from {}",
            pooled.len(),
            count,
            self.provider.name()
        );

        match self.refill(count).await {
            Ok(records) => {
                let take = count.min(records.len());
                self.annotate(&records[..take], user_id)
            }
            Err(e) if !pooled.is_empty() => {
                // Degrade to stale-but-present rather than failing the read
                warn!(
                    "Provider {} failed ({}), serving {} pooled quotes",
                    self.provider.name(),
                    e,
                    pooled.len()
                );
                let take = count.min(pooled.len());
                self.annotate(&pooled[..take], user_id)
            }
            Err(e) => Err(e),
        }
    }

    /// Flip the favorite edge for (user, quote) and return the new state
    ///
    /// The quote is resolved from the store first, then materialized
    /// from the pool if the store has never seen it. Errors here always
    /// propagate - a user-initiated mutation never degrades silently.
    pub async fn toggle_favorite(&self, external_id: &str, user_id: i64) -> Result<bool> {
        if !self.store.user_exists(user_id)? {
            return Err(Error::Unauthenticated(user_id));
        }

        let quote = match self.store.find_by_external_id(external_id)? {
            Some(row) => row,
            None => {
                // First favorite of a quote only the pool has seen
                let record = self
                    .pool_records()
                    .into_iter()
                    .find(|r| r.external_id == external_id)
                    .ok_or_else(|| Error::QuoteNotFound(external_id.to_string()))?;

                self.store
                    .upsert_quote(&record.external_id, &record.body, &record.author)?
            }
        };

        let is_favorite = self.store.toggle_favorite(user_id, quote.id)?;
        keys::invalidate_favorite(self.cache.as_ref(), user_id, external_id)?;

        info!(
            "Toggled favorite: user={} quote={} now={}",
            user_id, external_id, is_favorite
        );
        Ok(is_favorite)
    }

    /// All of the user's favorites, newest first, every record stamped
    /// `is_favorite = true`
    pub async fn get_favorites(&self, user_id: i64) -> Result<Vec<CachedQuote>> {
        if !self.store.user_exists(user_id)? {
            return Err(Error::Unauthenticated(user_id));
        }

        let cache_key = keys::user_favorites(user_id);
        if let Some(cached) = self.cache_get_json::<Vec<CachedQuote>>(&cache_key) {
            debug!("Favorites cache hit for user {}", user_id);
            return Ok(cached);
        }

        let favorites: Vec<CachedQuote> = self
            .store
            .favorites_for_user(user_id)?
            .iter()
            .map(|row| CachedQuote::from_row(row, true))
            .collect();

        self.cache_set_json(&cache_key, &favorites, self.favorite_ttl);
        Ok(favorites)
    }

    /// The daily quote, cached until end of day
    pub async fn quote_of_the_day(&self) -> Result<CachedQuote> {
        if let Some(cached) = self.cache_get_json::<CachedQuote>(keys::QUOTE_OF_THE_DAY) {
            debug!("Quote of the day served from cache");
            return Ok(cached);
        }

        let record = self.provider.quote_of_the_day().await?;
        self.store
            .upsert_quote(&record.external_id, &record.body, &record.author)?;

        let quote = CachedQuote::from_record(&record, false);
        self.cache_set_json(keys::QUOTE_OF_THE_DAY, &quote, until_end_of_day());

        info!("Fetched quote of the day from {}", self.provider.name());
        Ok(quote)
    }

    /// Wipe the shared caches (maintenance entry point)
    pub fn clear_quote_cache(&self) -> Result<()> {
        keys::clear_shared(self.cache.as_ref())
    }

    /// Fetch fresh records, persist them and add them to the pool
    ///
    /// Returns the merged pool contents so a short provider batch can
    /// still be topped up with older pooled records.
    async fn refill(&self, count: usize) -> Result<Vec<QuoteRecord>> {
        let records = self.provider.fetch_quotes(count).await?;

        if records.is_empty() {
            return Err(Error::ProviderUnavailable(format!(
                "{} returned no usable quotes",
                self.provider.name()
            )));
        }

        let mut members = Vec::with_capacity(records.len());
        for record in &records {
            self.store
                .upsert_quote(&record.external_id, &record.body, &record.author)?;
            members.push(serde_json::to_string(record)?);
        }

        if let Err(e) = self.cache.pool_add(keys::POOL, &members, self.pool_ttl) {
            debug!("Failed to pool {} quotes: {}", members.len(), e);
        }

        info!(
            "Refilled pool with {} quotes from {}",
            records.len(),
            self.provider.name()
        );

        // Fresh records first, then whatever was already pooled
        let mut merged = records;
        for pooled in self.pool_records() {
            if !merged.iter().any(|r| r.external_id == pooled.external_id) {
                merged.push(pooled);
            }
        }
        Ok(merged)
    }

    /// Decode the pool, dropping entries that no longer parse
    fn pool_records(&self) -> Vec<QuoteRecord> {
        let members = match self.cache.pool_members(keys::POOL) {
            Ok(members) => members,
            Err(e) => {
                debug!("Pool read failed: {}", e);
                return Vec::new();
            }
        };

        members
            .iter()
            .filter_map(|raw| match serde_json::from_str(raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("Dropping unparseable pool entry: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Stamp each record with the user's favorite status
    fn annotate(&self, records: &[QuoteRecord], user_id: i64) -> Result<Vec<CachedQuote>> {
        records
            .iter()
            .map(|record| {
                let is_favorite = self.is_favorite(user_id, &record.external_id)?;
                Ok(CachedQuote::from_record(record, is_favorite))
            })
            .collect()
    }

    /// Favorite-status check, cache-backed with a short TTL
    fn is_favorite(&self, user_id: i64, external_id: &str) -> Result<bool> {
        let cache_key = keys::favorite_status(user_id, external_id);
        if let Some(cached) = self.cache_get_json::<bool>(&cache_key) {
            return Ok(cached);
        }

        let is_favorite = match self.store.find_by_external_id(external_id)? {
            Some(row) => self.store.favorite_exists(user_id, row.id)?,
            // Never persisted means never favorited
            None => false,
        };

        self.cache_set_json(&cache_key, &is_favorite, self.favorite_ttl);
        Ok(is_favorite)
    }

    // Cache plumbing. Read and write failures are logged and treated as
    // misses; the cache accelerates reads, it doesn't gate them.

    fn cache_get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!("Dropping unparseable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    fn cache_set_json<T: serde::Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Failed to serialize cache value for {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.cache.set(key, raw, ttl) {
            debug!("Cache write failed for {}: {}", key, e);
        }
    }
}

/// Seconds until UTC midnight, for the quote-of-the-day TTL
fn until_end_of_day() -> Duration {
    let now = Utc::now();
    let tomorrow = (now + ChronoDuration::days(1))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time");
    let remaining = (tomorrow.and_utc() - now).num_seconds().max(60);
    Duration::from_secs(remaining as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockQuoteProvider;
    use quotevault_cache::MemoryCache;

    fn record(id: &str, body: &str, author: &str) -> QuoteRecord {
        QuoteRecord::normalize(Some(id.to_string()), body.to_string(), author.to_string())
            .expect("valid record")
    }

    struct Harness {
        store: Arc<QuoteStore>,
        cache: Arc<MemoryCache>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                store: Arc::new(QuoteStore::in_memory().unwrap()),
                cache: Arc::new(MemoryCache::new()),
            }
        }

        fn service(&self, provider: MockQuoteProvider) -> QuoteService {
            QuoteService::new(
                Box::new(provider),
                Arc::clone(&self.store),
                self.cache.clone() as Arc<dyn CacheBackend>,
            )
        }

        fn seed_pool(&self, records: &[QuoteRecord]) {
            let members: Vec<String> = records
                .iter()
                .map(|r| serde_json::to_string(r).unwrap())
                .collect();
            self.cache
                .pool_add(keys::POOL, &members, Duration::from_secs(60))
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_get_quotes_fetches_persists_and_pools() {
        let harness = Harness::new();
        let user = harness.store.ensure_user("alice").unwrap();

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        // Exactly one provider call; the second read must come from the pool
        provider.expect_fetch_quotes().times(1).returning(|_| {
            Ok(vec![
                record("1", "first", "a"),
                record("2", "second", "b"),
                record("3", "third", "c"),
            ])
        });

        let service = harness.service(provider);

        let quotes = service.get_quotes(3, user).await.unwrap();
        assert_eq!(quotes.len(), 3);
        assert!(quotes.iter().all(|q| !q.is_favorite));

        // Persisted
        assert_eq!(harness.store.quote_count().unwrap(), 3);
        // Second call is served by the pool (mock would panic on a second fetch)
        let again = service.get_quotes(3, user).await.unwrap();
        assert_eq!(again.len(), 3);
    }

    #[tokio::test]
    async fn test_get_quotes_degrades_to_pool_on_provider_failure() {
        let harness = Harness::new();
        let user = harness.store.ensure_user("alice").unwrap();

        let pooled: Vec<QuoteRecord> = (1..=5)
            .map(|i| record(&i.to_string(), &format!("body {}", i), "a"))
            .collect();
        harness.seed_pool(&pooled);

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch_quotes()
            .returning(|_| Err(Error::ProviderUnavailable("boom".into())));

        let service = harness.service(provider);

        // Asked for 10, provider dead, pool has 5: get the 5, not an error
        let quotes = service.get_quotes(10, user).await.unwrap();
        assert_eq!(quotes.len(), 5);
    }

    #[tokio::test]
    async fn test_get_quotes_fails_when_pool_empty_and_provider_down() {
        let harness = Harness::new();
        let user = harness.store.ensure_user("alice").unwrap();

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch_quotes()
            .returning(|_| Err(Error::ProviderUnavailable("boom".into())));

        let service = harness.service(provider);

        let result = service.get_quotes(10, user).await;
        assert!(matches!(result, Err(Error::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_toggle_is_a_flip_and_favorites_follow() {
        let harness = Harness::new();
        let user = harness.store.ensure_user("alice").unwrap();
        harness.store.upsert_quote("q1", "body", "author").unwrap();

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        let service = harness.service(provider);

        assert!(service.toggle_favorite("q1", user).await.unwrap());
        let favorites = service.get_favorites(user).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, "q1");
        assert!(favorites[0].is_favorite);

        assert!(!service.toggle_favorite("q1", user).await.unwrap());
        // The toggle invalidated the favorites-list cache, so this read
        // reflects the detach immediately instead of waiting out a TTL
        assert!(service.get_favorites(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_materializes_quote_from_pool() {
        let harness = Harness::new();
        let user = harness.store.ensure_user("alice").unwrap();
        harness.seed_pool(&[record("q1", "pooled body", "pooled author")]);

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        let service = harness.service(provider);

        // Not in the store yet - must be created from the pool
        assert!(harness.store.find_by_external_id("q1").unwrap().is_none());
        assert!(service.toggle_favorite("q1", user).await.unwrap());

        let row = harness
            .store
            .find_by_external_id("q1")
            .unwrap()
            .expect("row created from pool");
        assert_eq!(row.body, "pooled body");

        let favorites = service.get_favorites(user).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert!(favorites[0].is_favorite);
    }

    #[tokio::test]
    async fn test_toggle_unknown_quote_is_not_found() {
        let harness = Harness::new();
        let user = harness.store.ensure_user("alice").unwrap();

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        let service = harness.service(provider);

        let result = service.toggle_favorite("ghost", user).await;
        assert!(matches!(result, Err(Error::QuoteNotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_requires_a_known_user() {
        let harness = Harness::new();
        harness.store.upsert_quote("q1", "body", "author").unwrap();

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        let service = harness.service(provider);

        let result = service.toggle_favorite("q1", 999).await;
        assert!(matches!(result, Err(Error::Unauthenticated(999))));
    }

    #[tokio::test]
    async fn test_get_favorites_requires_a_known_user() {
        let harness = Harness::new();

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        let service = harness.service(provider);

        let result = service.get_favorites(999).await;
        assert!(matches!(result, Err(Error::Unauthenticated(999))));
    }

    #[tokio::test]
    async fn test_annotation_reflects_favorite_state() {
        let harness = Harness::new();
        let user = harness.store.ensure_user("alice").unwrap();
        harness.seed_pool(&[record("q1", "body", "author"), record("q2", "other", "b")]);
        harness.store.upsert_quote("q1", "body", "author").unwrap();

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        let service = harness.service(provider);

        service.toggle_favorite("q1", user).await.unwrap();
        // The toggle cleared the pool; reseed it as a later fetch would
        harness.seed_pool(&[record("q1", "body", "author"), record("q2", "other", "b")]);

        let quotes = service.get_quotes(2, user).await.unwrap();
        let q1 = quotes.iter().find(|q| q.id == "q1").unwrap();
        let q2 = quotes.iter().find(|q| q.id == "q2").unwrap();
        assert!(q1.is_favorite);
        assert!(!q2.is_favorite);
    }

    #[tokio::test]
    async fn test_short_provider_batch_is_topped_up_from_pool() {
        let harness = Harness::new();
        let user = harness.store.ensure_user("alice").unwrap();
        harness.seed_pool(&[record("old1", "old", "a"), record("old2", "older", "b")]);

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        // Provider only manages 2 of the 4 requested
        provider
            .expect_fetch_quotes()
            .times(1)
            .returning(|_| Ok(vec![record("new1", "fresh", "c"), record("new2", "fresher", "d")]));

        let service = harness.service(provider);

        let quotes = service.get_quotes(4, user).await.unwrap();
        assert_eq!(quotes.len(), 4);
        // Fresh records come first
        assert_eq!(quotes[0].id, "new1");
    }

    #[tokio::test]
    async fn test_duplicate_provider_ids_collapse_to_one_row() {
        let harness = Harness::new();
        let user = harness.store.ensure_user("alice").unwrap();

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch_quotes()
            .returning(|_| Ok(vec![record("1", "A", "X"), record("1", "B", "Y")]));

        let service = harness.service(provider);
        service.get_quotes(2, user).await.unwrap();

        // Both records were upserted in order; the second write wins
        assert_eq!(harness.store.quote_count().unwrap(), 1);
        let row = harness.store.find_by_external_id("1").unwrap().unwrap();
        assert_eq!(row.body, "B");
        assert_eq!(row.author, "Y");
    }

    #[tokio::test]
    async fn test_quote_of_the_day_is_cached() {
        let harness = Harness::new();

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_quote_of_the_day()
            .times(1)
            .returning(|| Ok(record("qotd", "daily wisdom", "someone")));

        let service = harness.service(provider);

        let first = service.quote_of_the_day().await.unwrap();
        let second = service.quote_of_the_day().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(harness.store.quote_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_quote_cache_forces_a_refetch() {
        let harness = Harness::new();
        let user = harness.store.ensure_user("alice").unwrap();

        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch_quotes()
            .times(2)
            .returning(|_| Ok(vec![record("1", "body", "a")]));

        let service = harness.service(provider);

        service.get_quotes(1, user).await.unwrap();
        service.clear_quote_cache().unwrap();
        // Pool is gone, so this must hit the provider again
        service.get_quotes(1, user).await.unwrap();
    }
}
