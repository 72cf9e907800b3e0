// API client implementations for the quote providers
pub mod favqs;
pub mod retry;
pub mod zenquotes;

// Re-export common types
pub use favqs::{FavQsClient, FavQsQuote};
pub use retry::RetryConfig;
pub use zenquotes::{ZenQuote, ZenQuotesClient};
