//! Per-user token-bucket throttling for billable actions.
//!
//! Refill is discrete: every whole `interval` that has elapsed since the
//! bucket's last refill adds `refill` tokens, capped at `capacity`. The Redis
//! script and the in-process limiter both apply `TokenBucket::take`.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::AppError;

pub mod memory;
pub mod redis_limiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBucketPolicy {
    pub capacity: u32,
    pub refill: u32,
    pub interval: Duration,
}

/// Interview creation: up to 12 sessions banked, 4 more per day.
pub const INTERVIEW_CREATION: TokenBucketPolicy = TokenBucketPolicy {
    capacity: 12,
    refill: 4,
    interval: Duration::from_secs(24 * 60 * 60),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allow,
    Deny,
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Takes `cost` tokens from the bucket for (`scope`, `user_id`).
    async fn check(
        &self,
        scope: &str,
        user_id: &str,
        cost: u32,
        policy: &TokenBucketPolicy,
    ) -> Result<RateDecision, AppError>;
}

/// Bucket state: remaining tokens and the instant (ms) of the last refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBucket {
    pub tokens: u32,
    pub refilled_at_ms: i64,
}

impl TokenBucket {
    pub fn full(policy: &TokenBucketPolicy, now_ms: i64) -> Self {
        Self {
            tokens: policy.capacity,
            refilled_at_ms: now_ms,
        }
    }

    /// Refills for elapsed intervals, then takes `cost` tokens if available.
    pub fn take(&mut self, policy: &TokenBucketPolicy, now_ms: i64, cost: u32) -> RateDecision {
        let interval_ms = policy.interval.as_millis() as i64;
        if interval_ms > 0 {
            let periods = (now_ms - self.refilled_at_ms).max(0) / interval_ms;
            if periods > 0 {
                let added = (periods as u64).saturating_mul(policy.refill as u64);
                self.tokens = (self.tokens as u64 + added).min(policy.capacity as u64) as u32;
                self.refilled_at_ms += periods * interval_ms;
            }
        }

        if self.tokens >= cost {
            self.tokens -= cost;
            RateDecision::Allow
        } else {
            RateDecision::Deny
        }
    }
}

/// Aborts with `RateLimited` when the bucket is empty.
pub async fn enforce(
    limiter: &dyn RateLimiter,
    scope: &str,
    user_id: &str,
    policy: &TokenBucketPolicy,
) -> Result<(), AppError> {
    match limiter.check(scope, user_id, 1, policy).await? {
        RateDecision::Allow => Ok(()),
        RateDecision::Deny => {
            tracing::warn!("Rate limit hit for user {user_id} on {scope}");
            Err(AppError::RateLimited)
        }
    }
}
