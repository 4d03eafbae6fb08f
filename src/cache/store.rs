//! On-Disk Asset Store
//!
//! The named cache store: holds pre-fetched resources on local disk as a
//! body file plus a JSON metadata sidecar, keyed by resource path.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use super::index::EntryIndex;

/// Metadata sidecar stored next to each cached body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMeta {
    /// Resource path (the cache key)
    pub path: String,
    /// Opaque version tag from the manifest
    pub version: String,
    /// HTTP status of the stored response
    pub status: u16,
    /// Content-Type of the stored response, if any
    pub content_type: Option<String>,
    /// Body size in bytes
    pub size: u64,
    /// Hex SHA-1 digest of the body
    pub sha1: String,
    /// Unix timestamp (seconds) when the entry was stored
    pub stored_at: u64,
}

/// A cached response returned by lookup
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Entry metadata from the sidecar
    pub meta: EntryMeta,
    /// Stored response body
    pub body: Vec<u8>,
}

/// Named on-disk store for pre-fetched resources
pub struct AssetStore {
    /// Cache name (subdirectory under the cache root)
    name: String,
    /// Directory holding response bodies
    objects_dir: PathBuf,
    /// Directory holding metadata sidecars
    meta_dir: PathBuf,
    /// In-memory index of entry metadata
    index: EntryIndex,
}

impl AssetStore {
    /// Open (or create) the named cache under the platform cache directory
    pub fn open(name: &str) -> Result<Self> {
        let root = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("precache");

        Self::open_in(&root, name)
    }

    /// Open (or create) the named cache under a custom root directory
    ///
    /// # Arguments
    /// * `root` - Directory holding all named caches
    /// * `name` - Cache name
    pub fn open_in(root: &Path, name: &str) -> Result<Self> {
        let base = root.join(name);
        let objects_dir = base.join("objects");
        let meta_dir = base.join("meta");

        fs::create_dir_all(&objects_dir)
            .with_context(|| format!("Failed to create cache directory: {:?}", objects_dir))?;
        fs::create_dir_all(&meta_dir)
            .with_context(|| format!("Failed to create cache directory: {:?}", meta_dir))?;

        let store = Self {
            name: name.to_string(),
            objects_dir,
            meta_dir,
            index: EntryIndex::new(),
        };

        // Clean up any stale temp files from interrupted writes
        store.cleanup();

        info!(
            cache = %store.name,
            dir = %base.display(),
            "Asset store opened"
        );

        Ok(store)
    }

    /// Get the cache name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a response body and its metadata under the given path
    ///
    /// Overwrites any existing entry for the path. Body and sidecar are
    /// each written atomically via temp file + rename.
    pub fn put(
        &self,
        path: &str,
        version: &str,
        status: u16,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<EntryMeta> {
        let meta = EntryMeta {
            path: path.to_string(),
            version: version.to_string(),
            status,
            content_type: content_type.map(str::to_string),
            size: body.len() as u64,
            sha1: hex_digest(body),
            stored_at: unix_now(),
        };

        write_atomic(&self.object_path(path), body)?;

        let meta_json =
            serde_json::to_vec_pretty(&meta).context("Failed to serialize entry metadata")?;
        write_atomic(&self.meta_path(path), &meta_json)?;

        self.index.insert(path, meta.clone());

        debug!(path = path, size = body.len(), "Stored entry in cache");
        Ok(meta)
    }

    /// Look up a cached response by resource path
    ///
    /// Returns the stored response if present and intact. An entry whose
    /// body no longer matches its sidecar (size or digest) is invalidated
    /// and reported as a miss.
    pub fn lookup(&self, path: &str) -> Result<Option<CachedResponse>> {
        let meta = match self.entry_meta(path) {
            Some(meta) => meta,
            None => {
                self.index.record_miss();
                debug!(path = path, "Cache MISS");
                return Ok(None);
            }
        };

        let body = match fs::read(self.object_path(path)) {
            Ok(body) => body,
            Err(e) => {
                warn!(path = path, error = %e, "Cache body missing, invalidating entry");
                self.invalidate(path);
                self.index.record_miss();
                return Ok(None);
            }
        };

        if body.len() as u64 != meta.size || hex_digest(&body) != meta.sha1 {
            warn!(
                path = path,
                expected_size = meta.size,
                actual_size = body.len(),
                "Cache entry failed integrity check, invalidating"
            );
            self.invalidate(path);
            self.index.record_miss();
            return Ok(None);
        }

        self.index.record_hit();
        debug!(path = path, "Cache HIT");
        Ok(Some(CachedResponse { meta, body }))
    }

    /// List metadata for all stored entries, sorted by path
    pub fn entries(&self) -> Result<Vec<EntryMeta>> {
        let mut out = Vec::new();
        collect_sidecars(&self.meta_dir, &mut out)?;
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    /// Get lookup counters
    ///
    /// Returns (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        self.index.stats()
    }

    /// Remove a cached entry from disk and the index
    fn invalidate(&self, path: &str) {
        let _ = fs::remove_file(self.object_path(path));
        let _ = fs::remove_file(self.meta_path(path));
        self.index.invalidate(path);
        debug!(path = path, "Invalidated cache entry");
    }

    /// Get entry metadata, from the index or its on-disk sidecar
    fn entry_meta(&self, path: &str) -> Option<EntryMeta> {
        if let Some(meta) = self.index.get(path) {
            return Some(meta);
        }

        let data = fs::read(self.meta_path(path)).ok()?;
        match serde_json::from_slice::<EntryMeta>(&data) {
            Ok(meta) => {
                self.index.insert(path, meta.clone());
                Some(meta)
            }
            Err(e) => {
                warn!(path = path, error = %e, "Corrupt entry sidecar, invalidating");
                self.invalidate(path);
                None
            }
        }
    }

    /// Clean up stale temp files left by interrupted writes
    fn cleanup(&self) {
        remove_stale_tmp(&self.objects_dir);
        remove_stale_tmp(&self.meta_dir);
    }

    /// Convert a resource path to its body file location
    fn object_path(&self, path: &str) -> PathBuf {
        self.objects_dir.join(safe_relative(path))
    }

    /// Convert a resource path to its sidecar location
    fn meta_path(&self, path: &str) -> PathBuf {
        self.meta_dir.join(format!("{}.json", safe_relative(path)))
    }
}

/// Replace characters that are problematic for the filesystem
fn safe_relative(path: &str) -> String {
    path.replace(':', "_")
}

/// Hex SHA-1 digest of a body
fn hex_digest(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Seconds since the Unix epoch
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Write a file atomically using a temp file in the target directory
fn write_atomic(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create cache subdirectory: {:?}", parent))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .context("Failed to create temp file for cache")?;

    tmp.write_all(data).context("Failed to write cache file")?;

    tmp.persist(target)
        .with_context(|| format!("Failed to persist cache file: {:?}", target))?;

    Ok(())
}

/// Recursively parse sidecar files under a directory
fn collect_sidecars(dir: &Path, out: &mut Vec<EntryMeta>) -> Result<()> {
    let read_dir = fs::read_dir(dir)
        .with_context(|| format!("Failed to read cache directory: {:?}", dir))?;

    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_sidecars(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match fs::read(&path)
                .ok()
                .and_then(|data| serde_json::from_slice::<EntryMeta>(&data).ok())
            {
                Some(meta) => out.push(meta),
                None => warn!(path = %path.display(), "Skipping unreadable sidecar"),
            }
        }
    }

    Ok(())
}

/// Recursively remove temp files (NamedTempFile `.tmp*` names)
fn remove_stale_tmp(dir: &Path) {
    if let Ok(read_dir) = fs::read_dir(dir) {
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.is_dir() {
                remove_stale_tmp(&path);
            } else if path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(".tmp"))
            {
                debug!(path = %path.display(), "Removing stale temp file");
                let _ = fs::remove_file(&path);
            }
        }
    }
}
