use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::warn;

use super::{Cache, CacheEntry, CacheTag, ENTRY_TTL};
use crate::errors::AppError;

const ENTRY_PREFIX: &str = "cache:entry:";
const TAG_PREFIX: &str = "cache:tag:";

/// Redis-backed cache shared by every API instance.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    pub async fn connect(client: &redis::Client) -> Result<Self, redis::RedisError> {
        Ok(Self {
            conn: client.get_multiplexed_async_connection().await?,
        })
    }
}

fn tag_key(tag: &CacheTag) -> String {
    format!("{TAG_PREFIX}{tag}")
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(format!("{ENTRY_PREFIX}{key}"))
            .query_async(&mut conn)
            .await?;

        Ok(raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Ignoring malformed cache entry {key}: {e}");
                None
            }
        }))
    }

    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), AppError> {
        let raw = serde_json::to_string(entry).map_err(|e| AppError::Internal(e.into()))?;
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(format!("{ENTRY_PREFIX}{key}"))
            .arg(raw)
            .arg("EX")
            .arg(ENTRY_TTL.as_secs())
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn versions(&self, tags: &[CacheTag]) -> Result<Vec<u64>, AppError> {
        if tags.is_empty() {
            return Ok(vec![]);
        }
        let keys: Vec<String> = tags.iter().map(tag_key).collect();
        let mut conn = self.conn.clone();
        let values: Vec<Option<u64>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await?;
        Ok(values.into_iter().map(|v| v.unwrap_or(0)).collect())
    }

    async fn invalidate(&self, tags: &[CacheTag]) -> Result<(), AppError> {
        let mut pipe = redis::pipe();
        for tag in tags {
            pipe.cmd("INCR").arg(tag_key(tag)).ignore();
        }
        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}
