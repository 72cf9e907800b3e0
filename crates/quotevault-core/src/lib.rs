// Core business logic lives here - the brain of the operation
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod provider;
pub mod providers;
pub mod service;

pub use config::Config;
pub use error::Error;
pub use models::{CachedQuote, QuoteRecord};
pub use provider::QuoteProvider;
pub use service::QuoteService;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
