//! In-memory cache backend.
//!
//! Bounded, TTL-aware store used as the fallback tier of
//! [`TieredCache`](super::TieredCache).

mod cache;

pub use cache::MemoryCache;
