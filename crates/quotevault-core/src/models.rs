use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use quotevault_store::QuoteRow;

/// Bodies longer than this render in the compact card layout
const LONG_QUOTE_THRESHOLD: usize = 200;

/// A normalized provider record - the star of the show
///
/// Every quote entering the system passes through [`QuoteRecord::normalize`]
/// first, so the rest of the code can rely on a non-empty body/author and a
/// stable external id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuoteRecord {
    pub external_id: String,
    pub body: String,
    pub author: String,
}

impl QuoteRecord {
    /// Validate a raw provider record and settle its external id
    ///
    /// Returns `None` when body or author is missing. A record without a
    /// native provider id gets a deterministic content hash instead, so
    /// the same quote maps to the same id across fetches.
    pub fn normalize(id: Option<String>, body: String, author: String) -> Option<Self> {
        if body.trim().is_empty() || author.trim().is_empty() {
            return None;
        }

        let external_id = match id {
            Some(id) if !id.trim().is_empty() => id,
            _ => content_hash(&body, &author),
        };

        Some(Self {
            external_id,
            body,
            author,
        })
    }
}

/// Deterministic id for quotes the provider didn't assign one to
///
/// Hash of body + author. Two providers serving the identical text by
/// the identical author collapse to one id, which is what we want for
/// dedup; identical text by different authors stays distinct.
pub fn content_hash(body: &str, author: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher.update(author.as_bytes());
    let digest = hasher.finalize();
    // 16 hex chars is plenty of keyspace for a quote collection
    format!("{:x}", digest)[..16].to_string()
}

/// A quote as handed to the presentation layer
///
/// Ephemeral and cache-resident: always reconstructible from the store
/// plus the favorites relation, never itself a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedQuote {
    pub id: String,
    pub body: String,
    pub author: String,
    pub is_favorite: bool,
    pub is_long: bool,
}

impl CachedQuote {
    pub fn from_record(record: &QuoteRecord, is_favorite: bool) -> Self {
        Self {
            id: record.external_id.clone(),
            body: record.body.clone(),
            author: record.author.clone(),
            is_favorite,
            is_long: is_long(&record.body),
        }
    }

    pub fn from_row(row: &QuoteRow, is_favorite: bool) -> Self {
        Self {
            id: row.external_id.clone(),
            body: row.body.clone(),
            author: row.author.clone(),
            is_favorite,
            is_long: is_long(&row.body),
        }
    }
}

/// Whether a body is long enough for the compact layout
pub fn is_long(body: &str) -> bool {
    body.len() > LONG_QUOTE_THRESHOLD
}
