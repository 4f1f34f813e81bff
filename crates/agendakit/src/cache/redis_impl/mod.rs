//! Redis cache backend implementation.
//!
//! Shared store for multi-instance deployments. Entries expire through Redis
//! TTLs; prefix deletion walks the keyspace with `KEYS`.

mod cache;
mod error;

pub use cache::RedisCache;
