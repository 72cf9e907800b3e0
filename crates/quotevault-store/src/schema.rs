pub const SCHEMA: &str = r#"
-- users table
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- quotes table
CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    body TEXT NOT NULL,
    author TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_quotes_external_id ON quotes(external_id);
CREATE INDEX IF NOT EXISTS idx_quotes_author ON quotes(author);

-- favorites relation
-- UNIQUE(user_id, quote_id) makes the edge a set: double-insert is
-- ignored, double-delete is a no-op
CREATE TABLE IF NOT EXISTS favorite_quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    quote_id INTEGER NOT NULL REFERENCES quotes(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(user_id, quote_id)
);

CREATE INDEX IF NOT EXISTS idx_favorite_quotes_user_id ON favorite_quotes(user_id);
CREATE INDEX IF NOT EXISTS idx_favorite_quotes_quote_id ON favorite_quotes(quote_id);
"#;
