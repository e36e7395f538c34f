//! Read-through cache with tag-based invalidation.
//!
//! Each cached entry records the version of every tag it was read under.
//! Invalidating a tag bumps its version, which turns every entry recorded
//! under the old version into a miss. Versions are snapshotted *before* the
//! load runs, so a write that lands while a read is in flight can only cause
//! an extra miss, never a stale hit.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::AppError;

pub mod memory;
pub mod redis_cache;
pub mod tags;

pub use tags::{global_tag, id_tag, job_posting_tag, user_tag, CacheTag, EntityKind};

/// Entries expire on their own in every backend, so an invalidation lost to
/// a backend outage cannot keep a stale value alive indefinitely.
pub const ENTRY_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagVersion {
    pub tag: CacheTag,
    pub version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub tags: Vec<TagVersion>,
}

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, AppError>;
    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), AppError>;
    /// Current version of each tag, in order. Unknown tags are version 0.
    async fn versions(&self, tags: &[CacheTag]) -> Result<Vec<u64>, AppError>;
    async fn invalidate(&self, tags: &[CacheTag]) -> Result<(), AppError>;
}

/// Returns the cached value for `key` if every tag it was stored under is
/// still current; otherwise runs `load` and caches its result under `tags`.
///
/// Cache failures never fail the read: the value is loaded directly.
pub async fn cached<T, F, Fut>(
    cache: &dyn Cache,
    key: &str,
    tags: &[CacheTag],
    load: F,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match lookup(cache, key).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(value) => {
                debug!("Cache hit: {key}");
                return Ok(value);
            }
            Err(e) => warn!("Discarding undecodable cache entry {key}: {e}"),
        },
        Ok(None) => debug!("Cache miss: {key}"),
        Err(e) => warn!("Cache lookup for {key} failed, loading directly: {e}"),
    }

    let snapshot = match cache.versions(tags).await {
        Ok(versions) => Some(versions),
        Err(e) => {
            warn!("Could not snapshot tag versions for {key}: {e}");
            None
        }
    };

    let value = load().await?;

    if let Some(versions) = snapshot {
        match serde_json::to_value(&value) {
            Ok(json) => {
                let entry = CacheEntry {
                    value: json,
                    tags: tags
                        .iter()
                        .cloned()
                        .zip(versions)
                        .map(|(tag, version)| TagVersion { tag, version })
                        .collect(),
                };
                if let Err(e) = cache.put(key, &entry).await {
                    warn!("Could not store cache entry {key}: {e}");
                }
            }
            Err(e) => warn!("Could not serialize cache entry {key}: {e}"),
        }
    }

    Ok(value)
}

/// Invalidates `tags`. Must complete before a write reports success.
pub async fn invalidate(cache: &dyn Cache, tags: &[CacheTag]) -> Result<(), AppError> {
    if tags.is_empty() {
        return Ok(());
    }
    cache.invalidate(tags).await?;
    debug!(
        "Invalidated cache tags: {}",
        tags.iter().map(CacheTag::as_str).collect::<Vec<_>>().join(", ")
    );
    Ok(())
}

async fn lookup(cache: &dyn Cache, key: &str) -> Result<Option<serde_json::Value>, AppError> {
    let Some(entry) = cache.get(key).await? else {
        return Ok(None);
    };
    let tags: Vec<CacheTag> = entry.tags.iter().map(|t| t.tag.clone()).collect();
    let current = cache.versions(&tags).await?;
    let fresh = entry
        .tags
        .iter()
        .zip(current)
        .all(|(recorded, now)| recorded.version == now);

    Ok(fresh.then_some(entry.value))
}
