//! Local cache for live upstream responses
//!
//! SQLite-backed, with a TTL per entry and a cap on the entry count.
//! Separate from the price store: this one only speeds up `live` lookups.

pub mod client;
pub mod key;
pub mod storage;

pub use client::CachedFipeClient;
pub use key::cache_key;
pub use storage::{ClearStats, ResponseCache, ResponseCacheStats};
