use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend failed: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Key/value cache with TTLs plus a set-like pool primitive
///
/// The service takes this as an injected dependency rather than reaching
/// into a process-wide cache, so tests can substitute an in-memory fake
/// and a Redis-backed implementation can slot in without touching the
/// service. Values are JSON strings; typed (de)serialization happens at
/// the call site.
pub trait CacheBackend: Send + Sync {
    /// Fetch a value, honoring its TTL. Expired entries read as absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value with a TTL
    fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Drop a key. Deleting a missing key is a no-op.
    fn delete(&self, key: &str) -> Result<()>;

    /// Add members to a set-like pool, refreshing the whole pool's TTL
    ///
    /// Duplicate members are ignored - the pool is a set, not a list
    /// with repeats.
    fn pool_add(&self, key: &str, members: &[String], ttl: Duration) -> Result<()>;

    /// List the members of a pool. An expired or missing pool reads as empty.
    fn pool_members(&self, key: &str) -> Result<Vec<String>>;
}
