use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::schema::SCHEMA;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A persisted quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRow {
    pub id: i64,
    pub external_id: String,
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Durable store for quotes, users and the favorites relation
///
/// A single SQLite connection behind a mutex. Every operation here is a
/// short single-statement unit of work, so contention is a non-issue at
/// this scale.
pub struct QuoteStore {
    conn: Mutex<Connection>,
}

impl QuoteStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    /// In-memory database, used by tests and throwaway runs
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // Quote operations

    /// Idempotent create-or-update keyed by external id
    ///
    /// Last write wins on body/author. Safe under concurrent calls with
    /// the same external id: the UNIQUE constraint routes both through
    /// the conflict branch.
    pub fn upsert_quote(&self, external_id: &str, body: &str, author: &str) -> Result<QuoteRow> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        conn.execute(
            r#"INSERT INTO quotes (external_id, body, author)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(external_id) DO UPDATE SET
                   body = excluded.body,
                   author = excluded.author,
                   updated_at = datetime('now')"#,
            params![external_id, body, author],
        )?;

        let row = conn.query_row(
            "SELECT id, external_id, body, author, created_at FROM quotes WHERE external_id = ?1",
            params![external_id],
            quote_from_row,
        )?;

        debug!("Upserted quote: external_id={}", external_id);
        Ok(row)
    }

    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<QuoteRow>> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        let row = conn
            .query_row(
                "SELECT id, external_id, body, author, created_at FROM quotes WHERE external_id = ?1",
                params![external_id],
                quote_from_row,
            )
            .optional()?;

        Ok(row)
    }

    pub fn quote_count(&self) -> Result<i64> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let count = conn.query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;
        Ok(count)
    }

    // User operations

    /// Look up a user by name, creating them on first sight
    pub fn ensure_user(&self, name: &str) -> Result<i64> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        conn.execute(
            "INSERT OR IGNORE INTO users (name) VALUES (?1)",
            params![name],
        )?;

        let id = conn.query_row(
            "SELECT id FROM users WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    pub fn user_exists(&self, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    // Favorite operations
    //
    // The edge is a set, not a counter. Insert-if-absent and
    // delete-if-present are both no-ops when the edge is already in the
    // desired state, which makes concurrent toggles benign.

    pub fn favorite_exists(&self, user_id: i64, quote_id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM favorite_quotes WHERE user_id = ?1 AND quote_id = ?2",
            params![user_id, quote_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// Insert the edge if absent. Returns whether a row was inserted.
    pub fn attach_favorite(&self, user_id: i64, quote_id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        let changed = conn.execute(
            "INSERT OR IGNORE INTO favorite_quotes (user_id, quote_id) VALUES (?1, ?2)",
            params![user_id, quote_id],
        )?;

        Ok(changed > 0)
    }

    /// Delete the edge if present. Returns whether a row was removed.
    pub fn detach_favorite(&self, user_id: i64, quote_id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        let changed = conn.execute(
            "DELETE FROM favorite_quotes WHERE user_id = ?1 AND quote_id = ?2",
            params![user_id, quote_id],
        )?;

        Ok(changed > 0)
    }

    /// Flip the edge and return the new state
    ///
    /// Set-membership command rather than read-then-write: try the
    /// insert first, and only when it was ignored fall through to the
    /// delete. Two racing toggles can still interleave, but each lands
    /// in a consistent state instead of erroring or duplicating rows.
    pub fn toggle_favorite(&self, user_id: i64, quote_id: i64) -> Result<bool> {
        if self.attach_favorite(user_id, quote_id)? {
            debug!("Favorite attached: user={} quote={}", user_id, quote_id);
            return Ok(true);
        }

        self.detach_favorite(user_id, quote_id)?;
        debug!("Favorite detached: user={} quote={}", user_id, quote_id);
        Ok(false)
    }

    /// All quotes the user has favorited, newest favorite first
    pub fn favorites_for_user(&self, user_id: i64) -> Result<Vec<QuoteRow>> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        let mut stmt = conn.prepare(
            r#"SELECT q.id, q.external_id, q.body, q.author, q.created_at
               FROM quotes q
               JOIN favorite_quotes f ON f.quote_id = q.id
               WHERE f.user_id = ?1
               ORDER BY f.created_at DESC, f.id DESC"#,
        )?;

        let rows = stmt
            .query_map(params![user_id], quote_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

fn quote_from_row(row: &Row) -> rusqlite::Result<QuoteRow> {
    Ok(QuoteRow {
        id: row.get(0)?,
        external_id: row.get(1)?,
        body: row.get(2)?,
        author: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?).unwrap_or_else(Utc::now),
    })
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // SQLite datetime('now') format first, RFC3339 as a fallback
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}
