use async_trait::async_trait;
use chrono::Utc;
use redis::aio::MultiplexedConnection;
use redis::Script;

use super::{RateDecision, RateLimiter, TokenBucketPolicy};
use crate::errors::AppError;

/// Same arithmetic as `TokenBucket::take`, applied atomically in Redis.
const TOKEN_BUCKET_SCRIPT: &str = r#"
local capacity = tonumber(ARGV[1])
local refill = tonumber(ARGV[2])
local interval = tonumber(ARGV[3])
local now = tonumber(ARGV[4])
local cost = tonumber(ARGV[5])

local state = redis.call('HMGET', KEYS[1], 'tokens', 'ts')
local tokens = tonumber(state[1])
local ts = tonumber(state[2])
if tokens == nil or ts == nil then
  tokens = capacity
  ts = now
end

local periods = math.floor(math.max(now - ts, 0) / interval)
if periods > 0 then
  tokens = math.min(capacity, tokens + periods * refill)
  ts = ts + periods * interval
end

local allowed = 0
if tokens >= cost then
  tokens = tokens - cost
  allowed = 1
end

redis.call('HSET', KEYS[1], 'tokens', tokens, 'ts', ts)
redis.call('PEXPIRE', KEYS[1], interval * (math.ceil(capacity / refill) + 1))
return allowed
"#;

#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    script: std::sync::Arc<Script>,
}

impl RedisRateLimiter {
    pub async fn connect(client: &redis::Client) -> Result<Self, redis::RedisError> {
        Ok(Self {
            conn: client.get_multiplexed_async_connection().await?,
            script: std::sync::Arc::new(Script::new(TOKEN_BUCKET_SCRIPT)),
        })
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(
        &self,
        scope: &str,
        user_id: &str,
        cost: u32,
        policy: &TokenBucketPolicy,
    ) -> Result<RateDecision, AppError> {
        let mut conn = self.conn.clone();
        let allowed: i64 = self
            .script
            .key(format!("ratelimit:{scope}:{user_id}"))
            .arg(policy.capacity)
            .arg(policy.refill.max(1))
            .arg(policy.interval.as_millis() as u64)
            .arg(Utc::now().timestamp_millis())
            .arg(cost)
            .invoke_async(&mut conn)
            .await?;

        Ok(if allowed == 1 {
            RateDecision::Allow
        } else {
            RateDecision::Deny
        })
    }
}
