//! Asset Worker
//!
//! The two cache event handlers: `install` pre-populates the named store
//! with every manifest resource, `fetch` serves cache-first with network
//! fallback.

use std::fmt;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cache::AssetStore;
use crate::manifest::{normalize_path, Manifest};
use crate::origin::{FetchedResource, Fetcher};

/// Where a response was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from the cache store
    Cache,
    /// Served by a network fetch from the origin
    Network,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSource::Cache => write!(f, "cache"),
            ResponseSource::Network => write!(f, "network"),
        }
    }
}

/// Response returned by the fetch handler
#[derive(Debug, Clone)]
pub struct AssetResponse {
    /// Normalized request path
    pub path: String,
    /// HTTP status of the response
    pub status: u16,
    /// Content-Type of the response, if known
    pub content_type: Option<String>,
    /// Response body
    pub body: Vec<u8>,
    /// Where the response came from
    pub source: ResponseSource,
}

/// Summary of a completed install
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Number of resources cached
    pub resources: usize,
    /// Total bytes stored
    pub total_bytes: u64,
}

/// Owns the cache store and the origin fetcher; runs the two handlers
pub struct AssetWorker {
    store: AssetStore,
    fetcher: Box<dyn Fetcher>,
}

impl AssetWorker {
    /// Create a worker over an opened store and an origin fetcher
    pub fn new(store: AssetStore, fetcher: Box<dyn Fetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Get the underlying store
    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Install handler: add every manifest resource to the cache
    ///
    /// All resources are fetched before anything is persisted, so a single
    /// unreachable resource fails the install without leaving a partially
    /// populated cache. Re-installing over an already-populated cache
    /// overwrites existing entries.
    pub async fn install(&self, manifest: &Manifest) -> Result<InstallReport> {
        info!(
            cache = %self.store.name(),
            origin = %self.fetcher.origin(),
            resources = manifest.len(),
            "Installing manifest into cache"
        );

        if manifest.is_empty() {
            warn!("Manifest lists no resources");
        }

        // Fetch everything first; a single failure aborts the whole install
        let mut fetched: Vec<(&str, &str, FetchedResource)> = Vec::with_capacity(manifest.len());
        for (path, version) in manifest.iter() {
            let resource = self
                .fetcher
                .fetch(path)
                .await
                .with_context(|| format!("Install aborted: failed to fetch '{}'", path))?;
            fetched.push((path, version, resource));
        }

        let mut total_bytes = 0u64;
        for (path, version, resource) in &fetched {
            self.store
                .put(
                    path,
                    version,
                    resource.status,
                    resource.content_type.as_deref(),
                    &resource.body,
                )
                .with_context(|| format!("Failed to store '{}'", path))?;
            total_bytes += resource.content_length();
        }

        info!(
            resources = fetched.len(),
            total_bytes = total_bytes,
            "Install complete"
        );

        Ok(InstallReport {
            resources: fetched.len(),
            total_bytes,
        })
    }

    /// Fetch handler: serve from cache, falling back to the network
    ///
    /// A hit returns the stored response unmodified, with zero network
    /// calls. A miss delegates to the origin and returns that response
    /// unmodified; the result is NOT written back into the cache.
    pub async fn fetch(&self, request_path: &str) -> Result<AssetResponse> {
        let path = normalize_path(request_path)?;

        if let Some(cached) = self.store.lookup(&path)? {
            debug!(path = %path, "Serving from cache");
            return Ok(AssetResponse {
                path,
                status: cached.meta.status,
                content_type: cached.meta.content_type,
                body: cached.body,
                source: ResponseSource::Cache,
            });
        }

        debug!(path = %path, "Not cached, fetching from origin");
        let resource = self
            .fetcher
            .fetch(&path)
            .await
            .with_context(|| format!("Network fetch failed for '{}'", path))?;

        Ok(AssetResponse {
            path,
            status: resource.status,
            content_type: resource.content_type,
            body: resource.body,
            source: ResponseSource::Network,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::OriginError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// In-memory origin for tests: fixed resources plus a call counter
    struct MockFetcher {
        resources: HashMap<String, Vec<u8>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        fn origin(&self) -> &str {
            "mock://origin"
        }

        async fn fetch(&self, path: &str) -> Result<FetchedResource, OriginError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.resources.get(path) {
                Some(body) => Ok(FetchedResource {
                    status: 200,
                    content_type: Some("text/plain".to_string()),
                    body: body.clone(),
                }),
                None => Err(OriginError::NotFound(format!("no such resource: {}", path))),
            }
        }
    }

    fn mock_worker(
        root: &Path,
        resources: &[(&str, &str)],
    ) -> (AssetWorker, Arc<AtomicUsize>) {
        let store = AssetStore::open_in(root, "test-cache").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = MockFetcher {
            resources: resources
                .iter()
                .map(|(path, body)| (path.to_string(), body.as_bytes().to_vec()))
                .collect(),
            calls: Arc::clone(&calls),
        };
        (AssetWorker::new(store, Box::new(fetcher)), calls)
    }

    #[tokio::test]
    async fn test_install_then_fetch_serves_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, calls) = mock_worker(
            dir.path(),
            &[("index.html", "<html>hi</html>"), ("main.js", "console.log(1)")],
        );
        let manifest =
            Manifest::from_entries([("index.html", "1"), ("main.js", "1")]).unwrap();

        let report = worker.install(&manifest).await.unwrap();
        assert_eq!(report.resources, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Every manifest path is now a cache hit with zero network calls
        let response = worker.fetch("index.html").await.unwrap();
        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(response.body, b"<html>hi</html>");
        assert_eq!(response.status, 200);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Request identity is the normalized path
        let response = worker.fetch("/main.js").await.unwrap();
        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_miss_delegates_without_populating() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, calls) = mock_worker(dir.path(), &[("api/data", "{\"ok\":true}")]);

        let response = worker.fetch("api/data").await.unwrap();
        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(response.body, b"{\"ok\":true}");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Misses are not cached: the same request goes to the network again
        let response = worker.fetch("api/data").await.unwrap();
        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_install_fails_whole_with_no_partial_population() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, _calls) = mock_worker(dir.path(), &[("index.html", "<html>")]);
        let manifest =
            Manifest::from_entries([("index.html", "1"), ("missing.js", "1")]).unwrap();

        assert!(worker.install(&manifest).await.is_err());

        // Nothing was persisted, not even the resource that fetched fine
        assert!(worker.store().entries().unwrap().is_empty());
        let response = worker.fetch("index.html").await.unwrap();
        assert_eq!(response.source, ResponseSource::Network);
    }

    #[tokio::test]
    async fn test_reinstall_overwrites_entries() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::from_entries([("index.html", "1")]).unwrap();

        let (worker, _) = mock_worker(dir.path(), &[("index.html", "old body")]);
        worker.install(&manifest).await.unwrap();

        // Second install over the same cache name, origin now serves new content
        let (worker, _) = mock_worker(dir.path(), &[("index.html", "new body")]);
        worker.install(&manifest).await.unwrap();

        let response = worker.fetch("index.html").await.unwrap();
        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(response.body, b"new body");
        assert_eq!(worker.store().entries().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, _) = mock_worker(dir.path(), &[]);

        assert!(worker.fetch("nothing/here").await.is_err());
    }

    #[tokio::test]
    async fn test_install_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, calls) = mock_worker(dir.path(), &[]);

        let report = worker.install(&Manifest::default()).await.unwrap();
        assert_eq!(report.resources, 0);
        assert_eq!(report.total_bytes, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
