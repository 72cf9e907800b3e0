// SQLite-backed durable state: quotes, users and the favorites relation
// Quotes are append-mostly; nothing in here ever deletes one

pub mod schema;
pub mod store;

pub use store::{QuoteRow, QuoteStore, StoreError};
