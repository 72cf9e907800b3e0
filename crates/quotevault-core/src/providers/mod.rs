// Provider adapters for the upstream quote APIs
pub mod favqs;
pub mod zenquotes;

pub use favqs::FavQsProvider;
pub use zenquotes::ZenQuotesProvider;
