// Cache backend abstraction plus the default in-memory implementation
// Injected into the quote service so tests can swap in whatever they like

pub mod backend;
pub mod memory;

pub use backend::{CacheBackend, CacheError};
pub use memory::MemoryCache;
