//! Resource Manifest
//!
//! The fixed mapping of resource paths to opaque version tags that gets
//! pre-fetched into the cache at install time. Loaded from a flat JSON
//! object file: `{"index.html": "1", "icons/icon-192.png": "1"}`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Cache name used when none is configured
pub const DEFAULT_CACHE_NAME: &str = "app-asset-cache";

/// Ordered mapping of resource paths to opaque version tags.
///
/// Version tags are carried alongside cached entries for display purposes
/// only; they are never consulted for invalidation.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    resources: BTreeMap<String, String>,
}

impl Manifest {
    /// Build a manifest from (path, version) pairs
    ///
    /// Paths are normalized; an invalid path fails the whole manifest.
    pub fn from_entries<I, P, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<String>,
    {
        let mut resources = BTreeMap::new();
        for (path, version) in entries {
            let normalized = normalize_path(path.as_ref())?;
            resources.insert(normalized, version.into());
        }
        Ok(Self { resources })
    }

    /// Load a manifest from a JSON file
    ///
    /// The file must contain a single flat JSON object mapping resource
    /// paths to version tag strings.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file: {:?}", path))?;
        let raw: BTreeMap<String, String> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse manifest file: {:?}", path))?;
        Self::from_entries(raw)
    }

    /// Number of resources in the manifest
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the manifest lists no resources
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate over (path, version) pairs in deterministic (sorted) order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resources
            .iter()
            .map(|(p, v)| (p.as_str(), v.as_str()))
    }
}

/// Normalize a manifest path into a relative cache location
///
/// Strips a single leading `/`. Rejects empty paths and any path with
/// empty, `.` or `..` components, since the path doubles as a relative
/// location inside the on-disk store.
pub fn normalize_path(raw: &str) -> Result<String> {
    let trimmed = raw.strip_prefix('/').unwrap_or(raw);
    if trimmed.is_empty() {
        bail!("Empty resource path in manifest");
    }
    for component in trimmed.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            bail!("Invalid resource path: '{}'", raw);
        }
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_strips_leading_slash() {
        assert_eq!(normalize_path("/index.html").unwrap(), "index.html");
        assert_eq!(normalize_path("index.html").unwrap(), "index.html");
        assert_eq!(
            normalize_path("icons/icon-192.png").unwrap(),
            "icons/icon-192.png"
        );
    }

    #[test]
    fn test_normalize_rejects_bad_paths() {
        assert!(normalize_path("").is_err());
        assert!(normalize_path("/").is_err());
        assert!(normalize_path("../etc/passwd").is_err());
        assert!(normalize_path("icons/../../escape").is_err());
        assert!(normalize_path("icons//double").is_err());
        assert!(normalize_path("./index.html").is_err());
    }

    #[test]
    fn test_from_entries_normalizes_and_sorts() {
        let manifest = Manifest::from_entries([
            ("/version.json", "1"),
            ("index.html", "1"),
            ("icons/icon-192.png", "2"),
        ])
        .unwrap();

        assert_eq!(manifest.len(), 3);
        let paths: Vec<&str> = manifest.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["icons/icon-192.png", "index.html", "version.json"]);
    }

    #[test]
    fn test_from_entries_rejects_traversal() {
        let result = Manifest::from_entries([("../escape", "1")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "index.html": "1",
                "main.js": "3",
                "favicon.png": "1"
            }}"#
        )
        .unwrap();

        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.len(), 3);
        let versions: Vec<(&str, &str)> = manifest.iter().collect();
        assert!(versions.contains(&("main.js", "3")));
    }

    #[test]
    fn test_load_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["index.html"]"#).unwrap();
        assert!(Manifest::load(file.path()).is_err());
    }
}
