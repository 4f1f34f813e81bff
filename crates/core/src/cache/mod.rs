//! Cache abstractions shared by every backend.
//!
//! Key construction lives here as pure functions; the backends themselves
//! live in the `agendakit` crate.

mod error;
mod keys;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    glob_escape, namespace_prefix, namespaced_key, product_prefix, resource_key,
    PRODUCT_NAMESPACE,
};
pub use traits::Cache;
