use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::{Cache, CacheEntry, CacheTag, ENTRY_TTL};
use crate::errors::AppError;

const MAX_ENTRIES: usize = 10_000;
const MAX_TAGS: usize = 50_000;

#[derive(Clone)]
struct StoredEntry {
    entry: CacheEntry,
    inserted_at: Instant,
}

struct TagVersion {
    version: u64,
    bumped_at: Instant,
}

/// Process-local cache, used when no Redis URL is configured.
///
/// Entries expire after [`ENTRY_TTL`]. Versions come from one counter shared
/// by all tags, so a tag that was forgotten and bumped again never reuses a
/// version an older entry recorded. A tag is only forgotten once its last
/// bump is older than the TTL, at which point every entry read under an
/// earlier version has expired too.
pub struct MemoryCache {
    entries: DashMap<String, StoredEntry>,
    versions: DashMap<CacheTag, TagVersion>,
    next_version: AtomicU64,
    max_entries: usize,
    max_tags: usize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_limits(MAX_ENTRIES, MAX_TAGS)
    }

    fn with_limits(max_entries: usize, max_tags: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(max_entries),
            versions: DashMap::new(),
            next_version: AtomicU64::new(1),
            max_entries,
            max_tags,
        }
    }

    fn evict_entries(&self) {
        self.entries
            .retain(|_, stored| stored.inserted_at.elapsed() < ENTRY_TTL);

        if self.entries.len() >= self.max_entries {
            let to_remove: Vec<String> = self
                .entries
                .iter()
                .take((self.max_entries / 10).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.entries.remove(&key);
            }
        }
    }

    fn forget_settled_tags(&self) {
        self.versions
            .retain(|_, tag| tag.bumped_at.elapsed() < ENTRY_TTL);
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, AppError> {
        let hit = self.entries.get(key).and_then(|stored| {
            (stored.inserted_at.elapsed() < ENTRY_TTL).then(|| stored.entry.clone())
        });
        if hit.is_none() {
            self.entries
                .remove_if(key, |_, stored| stored.inserted_at.elapsed() >= ENTRY_TTL);
        }
        Ok(hit)
    }

    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), AppError> {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(key) {
            self.evict_entries();
        }
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                entry: entry.clone(),
                inserted_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn versions(&self, tags: &[CacheTag]) -> Result<Vec<u64>, AppError> {
        Ok(tags
            .iter()
            .map(|tag| self.versions.get(tag).map(|v| v.version).unwrap_or(0))
            .collect())
    }

    async fn invalidate(&self, tags: &[CacheTag]) -> Result<(), AppError> {
        if self.versions.len() >= self.max_tags {
            self.forget_settled_tags();
        }
        for tag in tags {
            let version = self.next_version.fetch_add(1, Ordering::Relaxed);
            self.versions.insert(
                tag.clone(),
                TagVersion {
                    version,
                    bumped_at: Instant::now(),
                },
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;
    use crate::cache::{cached, global_tag, id_tag, invalidate, EntityKind};

    async fn read(cache: &MemoryCache, key: &str, loads: &AtomicUsize, tags: &[CacheTag]) -> usize {
        cached(cache, key, tags, || async {
            Ok::<_, AppError>(loads.fetch_add(1, Ordering::SeqCst))
        })
        .await
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_reloaded() {
        let cache = MemoryCache::new();
        let loads = AtomicUsize::new(0);
        let tags = [id_tag(EntityKind::Interviews, Uuid::new_v4())];

        assert_eq!(read(&cache, "interview", &loads, &tags).await, 0);
        tokio::time::advance(ENTRY_TTL - Duration::from_secs(1)).await;
        assert_eq!(read(&cache, "interview", &loads, &tags).await, 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(read(&cache, "interview", &loads, &tags).await, 1);
    }

    #[tokio::test]
    async fn test_entry_count_stays_bounded() {
        let cache = MemoryCache::with_limits(100, 100);
        let loads = AtomicUsize::new(0);

        for i in 0..1_000 {
            read(&cache, &format!("key-{i}"), &loads, &[]).await;
        }
        assert!(cache.entries.len() <= 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forgotten_tags_do_not_revive_stale_entries() {
        let cache = MemoryCache::with_limits(100, 2);
        let loads = AtomicUsize::new(0);
        let tag = global_tag(EntityKind::JobPostings);
        let tags = [tag.clone()];

        invalidate(&cache, &tags).await.unwrap();
        assert_eq!(read(&cache, "list", &loads, &tags).await, 0);

        // Settle the tag, then push the tag map over its limit so it is forgotten.
        tokio::time::advance(ENTRY_TTL).await;
        invalidate(&cache, &[id_tag(EntityKind::Questions, Uuid::new_v4())])
            .await
            .unwrap();
        invalidate(&cache, &[id_tag(EntityKind::Questions, Uuid::new_v4())])
            .await
            .unwrap();
        assert_eq!(cache.versions(&tags).await.unwrap(), vec![0]);

        assert_eq!(read(&cache, "list", &loads, &tags).await, 1);
        invalidate(&cache, &tags).await.unwrap();
        assert_eq!(read(&cache, "list", &loads, &tags).await, 2);
        assert!(cache.versions.len() <= 3);
    }
}
