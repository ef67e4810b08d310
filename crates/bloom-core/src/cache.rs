//! On-disk cache of fetched resources with SHA-based deduplication
//!
//! Successfully fetched sources are stored under their SHA256 so that a
//! candidate whose network fetch fails can still be served from the last
//! good copy. The manifest maps each source URL to the SHA of its latest
//! content; identical content from different URLs is stored once.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::CacheError;

/// Cache manifest entry for a single stored file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResource {
    /// SHA256 hash of the content
    pub sha: String,
    /// Local file path (relative to cache directory)
    pub path: String,
    /// When this was fetched (RFC 3339)
    pub fetched_at: String,
    /// Size in bytes
    pub size: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheManifest {
    #[serde(default = "default_version")]
    pub version: String,
    /// Stored files keyed by SHA
    pub resources: HashMap<String, CachedResource>,
    /// Source URL -> SHA of the most recent content
    pub urls: HashMap<String, String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl CacheManifest {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            resources: HashMap::new(),
            urls: HashMap::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, CacheError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load manifest or create new if file doesn't exist
    pub fn load_or_create(path: &Path) -> Result<Self, CacheError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn sha_for_url(&self, url: &str) -> Option<&str> {
        self.urls.get(url).map(|s| s.as_str())
    }
}

/// Cache directory manager
#[derive(Debug, Clone)]
pub struct ResourceCache {
    pub base_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: CacheManifest,
}

impl ResourceCache {
    /// Open (or create) a cache rooted at `base_dir`.
    ///
    /// An unreadable manifest is replaced by an empty one; the next `store`
    /// overwrites it.
    pub fn new(base_dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&base_dir)?;

        let manifest_path = base_dir.join("manifest.json");
        let manifest = match CacheManifest::load_or_create(&manifest_path) {
            Ok(manifest) => manifest,
            Err(CacheError::JsonError(e)) => {
                warn!(path = %manifest_path.display(), error = %e, "Corrupt cache manifest, starting fresh");
                CacheManifest::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            base_dir,
            manifest_path,
            manifest,
        })
    }

    /// Short SHA (first 8 characters) used in file names
    pub fn short_sha(sha: &str) -> &str {
        &sha[..8.min(sha.len())]
    }

    /// Check that `url` has a manifest entry whose file still exists
    pub fn has_url(&self, url: &str) -> bool {
        self.path_for_url(url).map(|p| p.exists()).unwrap_or(false)
    }

    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let sha = self.manifest.sha_for_url(url)?;
        let entry = self.manifest.resources.get(sha)?;
        Some(self.base_dir.join(&entry.path))
    }

    /// Store content fetched from `url`, returning the file path
    pub fn store(&mut self, url: &str, content: &[u8]) -> Result<PathBuf, CacheError> {
        let sha = sha256_hex(content);

        // Same content already on disk, whichever URL it came from
        let existing = self
            .manifest
            .resources
            .get(&sha)
            .map(|entry| self.base_dir.join(&entry.path))
            .filter(|path| path.exists());

        let path = match existing {
            Some(path) => path,
            None => {
                let file_name = format!("{}-{}", Self::short_sha(&sha), file_name_from_url(url));
                let path = self.base_dir.join(&file_name);
                std::fs::write(&path, content)?;
                self.manifest.resources.insert(
                    sha.clone(),
                    CachedResource {
                        sha: sha.clone(),
                        path: file_name,
                        fetched_at: chrono::Utc::now().to_rfc3339(),
                        size: content.len() as u64,
                    },
                );
                path
            }
        };

        self.manifest.urls.insert(url.to_string(), sha);
        self.manifest.save(&self.manifest_path)?;

        Ok(path)
    }

    /// Read the latest cached content for `url`
    pub fn read_by_url(&self, url: &str) -> Result<String, CacheError> {
        let path = self
            .path_for_url(url)
            .ok_or_else(|| CacheError::NotCached(url.to_string()))?;
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Last path segment of a URL, or "resource" when there is none
fn file_name_from_url(url: &str) -> &str {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme
        .split_once('/')
        .and_then(|(_, path)| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("resource")
}

/// Compute SHA256 hash of data and return as hex string
pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
