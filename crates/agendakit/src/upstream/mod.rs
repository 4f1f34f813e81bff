//! Authenticated access to the upstream events API.
//!
//! [`TokenManager`] owns the bearer credential; [`UpstreamClient`] uses it to
//! call the API and caches GET responses in the [`TieredCache`](crate::cache::TieredCache).

mod client;
mod error;
mod token;

pub use client::UpstreamClient;
pub use error::{AuthenticationError, Result, UpstreamError};
pub use token::TokenManager;
