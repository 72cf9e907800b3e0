use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::backend::{CacheBackend, Result};

struct Entry {
    value: String,
    expires_at: Instant,
}

struct PoolEntry {
    // Insertion-ordered members with a side set for dedup, so reads
    // come back in the order quotes arrived
    members: Vec<String>,
    seen: HashSet<String>,
    expires_at: Instant,
}

/// In-memory cache backend
///
/// The default for single-process deployments and the fake of choice in
/// tests. Expiry is lazy: entries are dropped when a read finds them
/// stale, there is no sweeper task to depend on.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    pools: Mutex<HashMap<String, PoolEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                trace!("Evicting expired cache entry: {}", key);
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .remove(key);
        self.pools
            .lock()
            .expect("cache mutex poisoned")
            .remove(key);
        Ok(())
    }

    fn pool_add(&self, key: &str, members: &[String], ttl: Duration) -> Result<()> {
        let mut pools = self.pools.lock().expect("cache mutex poisoned");
        let now = Instant::now();

        let pool = pools.entry(key.to_string()).or_insert_with(|| PoolEntry {
            members: Vec::new(),
            seen: HashSet::new(),
            expires_at: now + ttl,
        });

        // A stale pool gets replaced wholesale rather than appended to
        if pool.expires_at <= now {
            pool.members.clear();
            pool.seen.clear();
        }

        for member in members {
            if pool.seen.insert(member.clone()) {
                pool.members.push(member.clone());
            }
        }
        pool.expires_at = now + ttl;

        Ok(())
    }

    fn pool_members(&self, key: &str) -> Result<Vec<String>> {
        let mut pools = self.pools.lock().expect("cache mutex poisoned");

        match pools.get(key) {
            Some(pool) if pool.expires_at > Instant::now() => Ok(pool.members.clone()),
            Some(_) => {
                trace!("Evicting expired pool: {}", key);
                pools.remove(key);
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }
}
