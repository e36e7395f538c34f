use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::{RateDecision, RateLimiter, TokenBucket, TokenBucketPolicy};
use crate::errors::AppError;

/// Single-instance limiter, used when no Redis URL is configured.
#[derive(Default)]
pub struct MemoryRateLimiter {
    buckets: DashMap<String, TokenBucket>,
}

impl MemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_at(
        &self,
        scope: &str,
        user_id: &str,
        cost: u32,
        policy: &TokenBucketPolicy,
        now_ms: i64,
    ) -> RateDecision {
        let mut bucket = self
            .buckets
            .entry(format!("{scope}:{user_id}"))
            .or_insert_with(|| TokenBucket::full(policy, now_ms));
        bucket.take(policy, now_ms, cost)
    }
}

#[async_trait]
impl RateLimiter for MemoryRateLimiter {
    async fn check(
        &self,
        scope: &str,
        user_id: &str,
        cost: u32,
        policy: &TokenBucketPolicy,
    ) -> Result<RateDecision, AppError> {
        Ok(self.check_at(scope, user_id, cost, policy, Utc::now().timestamp_millis()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::INTERVIEW_CREATION;

    #[test]
    fn test_buckets_are_per_user() {
        let limiter = MemoryRateLimiter::new();
        let policy = INTERVIEW_CREATION;
        for _ in 0..policy.capacity {
            assert_eq!(
                limiter.check_at("interviews", "user_a", 1, &policy, 0),
                RateDecision::Allow
            );
        }
        assert_eq!(
            limiter.check_at("interviews", "user_a", 1, &policy, 0),
            RateDecision::Deny
        );
        assert_eq!(
            limiter.check_at("interviews", "user_b", 1, &policy, 0),
            RateDecision::Allow
        );
    }
}
