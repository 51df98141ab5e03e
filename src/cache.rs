//! File-backed cache for provider responses.
//!
//! Entries are keyed by the SHA-256 of the request URL and expire after a
//! fixed age. Cache failures are logged and treated as misses; they never
//! fail a fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    url: String,
    body: String,
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    expiry: Duration,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, expiry: Duration) -> Self {
        Self {
            dir: dir.into(),
            expiry,
        }
    }

    /// Cache key for a URL
    pub fn key(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::key(url)))
    }

    /// Return a fresh cached body for `url`, if any.
    pub async fn get(&self, url: &str) -> Option<String> {
        self.get_at(url, Utc::now()).await
    }

    async fn get_at(&self, url: &str, now: DateTime<Utc>) -> Option<String> {
        let path = self.path_for(url);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        // Guard against hash collisions and hand-edited files
        if entry.url != url {
            return None;
        }

        let age = now
            .signed_duration_since(entry.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        if age >= self.expiry {
            debug!("Cache entry for {} expired ({:?} old)", url, age);
            return None;
        }

        debug!("Cache hit for {} ({:?} old)", url, age);
        Some(entry.body)
    }

    /// Store a response body for `url`.
    pub async fn put(&self, url: &str, body: &str) {
        self.put_at(url, body, Utc::now()).await
    }

    async fn put_at(&self, url: &str, body: &str, now: DateTime<Utc>) {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(
                "Failed to create cache directory {}: {}",
                self.dir.display(),
                e
            );
            return;
        }

        let entry = CacheEntry {
            fetched_at: now,
            url: url.to_string(),
            body: body.to_string(),
        };
        let content = match serde_json::to_string(&entry) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to serialize cache entry for {}: {}", url, e);
                return;
            }
        };

        let path = self.path_for(url);
        if let Err(e) = tokio::fs::write(&path, content).await {
            warn!("Failed to write cache entry {}: {}", path.display(), e);
        }
    }
}
