//! Origin network-fetch interface
//!
//! The outbound network side of the cache: a [`Fetcher`] seam plus the
//! reqwest-backed [`OriginClient`] implementation.

pub mod client;
pub mod errors;
pub mod types;

pub use client::OriginClient;
pub use errors::OriginError;
pub use types::FetchedResource;

use async_trait::async_trait;

/// Interface for performing network fetches of resources by path.
///
/// Implemented by [`OriginClient`] for real HTTP origins; tests substitute
/// an in-memory implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Origin identifier (base URL), used for logging
    fn origin(&self) -> &str;

    /// Fetch a resource by its relative path
    async fn fetch(&self, path: &str) -> Result<FetchedResource, OriginError>;
}
