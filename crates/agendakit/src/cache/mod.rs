//! Cache backends and the two-tier store built on them.
//!
//! - `memory`: bounded in-process store, always present.
//! - `redis_impl`: shared Redis store, used when `REDIS_ENABLED` is set.
//! - `tiered`: the store handlers use, preferring Redis and falling back to
//!   memory when Redis fails.

pub mod memory;
pub mod redis_impl;
mod tiered;

pub use memory::MemoryCache;
pub use redis_impl::RedisCache;
pub use tiered::{BackendState, CacheStats, RedisStatus, TieredCache};

#[cfg(test)]
pub(crate) use tiered::tests::test_cache_config;
