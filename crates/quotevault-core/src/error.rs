use thiserror::Error;

/// All the ways things can go wrong in QuoteVault
///
/// We use thiserror here because it generates the boilerplate for us.
/// Life's too short to manually implement Display and Error traits.
#[derive(Error, Debug)]
pub enum Error {
    /// The provider is down and no cached data could stand in for it.
    /// Retryable from the caller's point of view.
    #[error("Quote provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Toggle target absent from both the store and the pool cache
    #[error("Quote not found: {0}")]
    QuoteNotFound(String),

    /// No such principal
    #[error("User {0} is not authenticated")]
    Unauthenticated(i64),

    /// Provider handed back a record missing body or author
    #[error("Invalid quote data: {0}")]
    InvalidQuoteData(String),

    #[error("Store error: {0}")]
    Store(#[from] quotevault_store::StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] quotevault_cache::CacheError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
