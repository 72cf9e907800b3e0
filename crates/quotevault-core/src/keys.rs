//! Cache key naming and invalidation, all in one place
//!
//! Every derived cache key the service reads is declared here, and the
//! invalidation functions clear fixed sets of them. No other module is
//! allowed to invent key names.

use quotevault_cache::CacheBackend;
use tracing::debug;

use crate::Result;

/// Shared pool of recently fetched quotes, user-independent
pub const POOL: &str = "quotes:all";

/// The daily quote, user-independent
pub const QUOTE_OF_THE_DAY: &str = "quote_of_the_day";

/// Per-user favorite status for one quote, short TTL
pub fn favorite_status(user_id: i64, external_id: &str) -> String {
    format!("quote_favorite:{}:{}", user_id, external_id)
}

/// A user's aggregated favorites list. Versioned so a format change
/// doesn't have to deserialize stale entries.
pub fn user_favorites(user_id: i64) -> String {
    format!("quotes:favorites:{}:v1", user_id)
}

/// Clear every cache entry derived from this (user, quote) pair
///
/// Deliberately clears more than the minimum: the shared pool goes too,
/// since favorite-filtered views derive from it. Hit rate is traded for
/// never serving a stale favorite flag.
pub fn invalidate_favorite(
    cache: &dyn CacheBackend,
    user_id: i64,
    external_id: &str,
) -> Result<()> {
    cache.delete(&favorite_status(user_id, external_id))?;
    cache.delete(&user_favorites(user_id))?;
    cache.delete(POOL)?;

    debug!(
        "Invalidated favorite caches: user={} quote={}",
        user_id, external_id
    );
    Ok(())
}

/// Clear the user-independent caches (pool and daily quote)
///
/// Per-user entries are left to their short TTLs; there is no registry
/// of user ids to enumerate and reads self-heal on expiry.
pub fn clear_shared(cache: &dyn CacheBackend) -> Result<()> {
    cache.delete(POOL)?;
    cache.delete(QUOTE_OF_THE_DAY)?;

    debug!("Cleared shared quote caches");
    Ok(())
}
