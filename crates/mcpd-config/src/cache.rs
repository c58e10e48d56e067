//! On-disk cache for downloaded registry manifests.
//!
//! Keyed by the SHA-256 of the source URL, published atomically, and aged
//! by file mtime against a TTL. Disabled mode touches no directories.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Fetch-through cache for manifest bodies.
#[derive(Debug, Clone)]
pub struct ManifestCache {
    dir: Option<PathBuf>,
    ttl: Duration,
    client: reqwest::Client,
}

impl ManifestCache {
    pub fn new(dir: PathBuf, ttl: Duration) -> Self {
        Self {
            dir: Some(dir),
            ttl,
            client: reqwest::Client::new(),
        }
    }

    /// A cache that always fetches from the source URL and never creates
    /// its directory.
    pub fn disabled() -> Self {
        Self {
            dir: None,
            ttl: DEFAULT_TTL,
            client: reqwest::Client::new(),
        }
    }

    /// Return the manifest body for `url`.
    ///
    /// Order of preference: fresh cache file, live fetch (repopulating the
    /// cache), stale cache file when the fetch fails. A cache-write failure
    /// is a warning, not an error: the fetched body is still returned.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let path = self.entry_path(url);

        if let Some(path) = &path {
            if is_fresh(path, self.ttl) {
                return fs::read_to_string(path)
                    .with_context(|| format!("failed to read cached manifest: {}", path.display()));
            }
        }

        match self.download(url).await {
            Ok(body) => {
                if let Some(path) = &path {
                    if let Err(error) = publish(path, &body) {
                        tracing::warn!(url = %url, error = %error, "failed to cache manifest");
                    }
                }
                Ok(body)
            }
            Err(error) => {
                if let Some(path) = path.filter(|p| p.exists()) {
                    tracing::warn!(url = %url, error = %error, "fetch failed, serving stale cache");
                    return fs::read_to_string(&path).with_context(|| {
                        format!("failed to read stale cached manifest: {}", path.display())
                    });
                }
                Err(error)
            }
        }
    }

    async fn download(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to fetch manifest: {url}"))?
            .error_for_status()
            .with_context(|| format!("manifest fetch returned an error status: {url}"))?;
        response
            .text()
            .await
            .with_context(|| format!("failed to read manifest body: {url}"))
    }

    fn entry_path(&self, url: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let digest = Sha256::digest(url.as_bytes());
        let mut key = String::with_capacity(64);
        for byte in digest {
            key.push_str(&format!("{byte:02x}"));
        }
        Some(dir.join(format!("{key}.json")))
    }
}

fn is_fresh(path: &std::path::Path, ttl: Duration) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    let Ok(mtime) = metadata.modified() else {
        return false;
    };
    SystemTime::now()
        .duration_since(mtime)
        .map(|age| age <= ttl)
        .unwrap_or(true)
}

fn publish(path: &std::path::Path, body: &str) -> Result<()> {
    let parent = path
        .parent()
        .context("cache entry path has no parent directory")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create cache directory: {}", parent.display()))?;

    // Atomic publish: write to temp file then rename.
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, body.as_bytes())
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
