//! Plan-tier entitlement checks for limited resources.
//!
//! Tiers are evaluated in order: an unlimited permission grants outright;
//! otherwise a limited permission grants while live usage is below its
//! limit. Usage is read from the store, never from the cache, and only when
//! the limited tier is the deciding one.

use tracing::warn;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Interview,
    Question,
    ResumeAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaRule {
    pub unlimited: &'static str,
    /// Permission and allowance for the free tier, if the resource has one.
    pub limited: Option<(&'static str, i64)>,
}

impl Resource {
    pub fn rule(&self) -> QuotaRule {
        match self {
            Resource::Interview => QuotaRule {
                unlimited: "unlimited_interviews",
                limited: Some(("1_interview", 1)),
            },
            Resource::Question => QuotaRule {
                unlimited: "unlimited_questions",
                limited: Some(("5_questions", 5)),
            },
            Resource::ResumeAnalysis => QuotaRule {
                unlimited: "unlimited_resume_analysis",
                limited: None,
            },
        }
    }

    async fn usage(&self, store: &dyn Store, user_id: &str) -> Result<i64, AppError> {
        match self {
            Resource::Interview => store.count_completed_interviews(user_id).await,
            Resource::Question => store.count_questions(user_id).await,
            Resource::ResumeAnalysis => Ok(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    Granted,
    Denied,
    /// Decided by the free-tier allowance against current usage.
    NeedsUsage(i64),
}

/// The decision that can be made from permissions alone.
pub fn decide(rule: &QuotaRule, user: &AuthUser) -> Entitlement {
    if user.has_permission(rule.unlimited) {
        return Entitlement::Granted;
    }
    match rule.limited {
        Some((permission, limit)) if user.has_permission(permission) => {
            Entitlement::NeedsUsage(limit)
        }
        _ => Entitlement::Denied,
    }
}

/// Fails with `PlanLimit` unless `user` may create another `resource`.
pub async fn ensure_entitled(
    store: &dyn Store,
    user: &AuthUser,
    resource: Resource,
) -> Result<(), AppError> {
    let granted = match decide(&resource.rule(), user) {
        Entitlement::Granted => true,
        Entitlement::Denied => false,
        Entitlement::NeedsUsage(limit) => resource.usage(store, &user.user_id).await? < limit,
    };

    if granted {
        Ok(())
    } else {
        warn!("Plan limit reached for user {} on {:?}", user.user_id, resource);
        Err(AppError::PlanLimit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::{InterviewUpdate, INITIAL_DURATION};
    use crate::models::job_posting::{ExperienceLevel, JobPostingInput};
    use crate::models::user::UpsertUser;
    use crate::store::memory::MemoryStore;

    fn user(permissions: &[&str]) -> AuthUser {
        AuthUser {
            user_id: "user_a".to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    async fn seeded_store() -> (MemoryStore, uuid::Uuid) {
        let store = MemoryStore::new();
        let now = chrono::Utc::now();
        store
            .upsert_user(&UpsertUser {
                id: "user_a".to_string(),
                name: "A".to_string(),
                email: "a@example.com".to_string(),
                image_url: String::new(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        let job_posting = store
            .insert_job_posting(
                "user_a",
                &JobPostingInput {
                    name: "Backend".to_string(),
                    title: None,
                    description: "Rust".to_string(),
                    experience_level: ExperienceLevel::Junior,
                },
            )
            .await
            .unwrap();
        (store, job_posting.id)
    }

    #[test]
    fn test_decide_prefers_unlimited_tier() {
        let rule = Resource::Interview.rule();
        assert_eq!(
            decide(&rule, &user(&["1_interview", "unlimited_interviews"])),
            Entitlement::Granted
        );
        assert_eq!(decide(&rule, &user(&["1_interview"])), Entitlement::NeedsUsage(1));
        assert_eq!(decide(&rule, &user(&[])), Entitlement::Denied);
        assert_eq!(
            decide(&rule, &user(&["unlimited_questions"])),
            Entitlement::Denied
        );
    }

    #[test]
    fn test_resume_analysis_has_no_free_tier() {
        let rule = Resource::ResumeAnalysis.rule();
        assert_eq!(decide(&rule, &user(&["5_questions"])), Entitlement::Denied);
        assert_eq!(
            decide(&rule, &user(&["unlimited_resume_analysis"])),
            Entitlement::Granted
        );
    }

    #[tokio::test]
    async fn test_free_interview_counts_only_connected_sessions() {
        let (store, job_posting_id) = seeded_store().await;
        let free = user(&["1_interview"]);

        assert!(ensure_entitled(&store, &free, Resource::Interview).await.is_ok());

        // Never connected: does not consume the allowance.
        store
            .insert_interview(job_posting_id, INITIAL_DURATION)
            .await
            .unwrap();
        assert!(ensure_entitled(&store, &free, Resource::Interview).await.is_ok());

        let connected = store
            .insert_interview(job_posting_id, INITIAL_DURATION)
            .await
            .unwrap();
        store
            .update_interview(
                connected.id,
                &InterviewUpdate {
                    voice_chat_id: Some("chat_1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            ensure_entitled(&store, &free, Resource::Interview).await,
            Err(AppError::PlanLimit)
        ));

        let unlimited = user(&["unlimited_interviews"]);
        assert!(ensure_entitled(&store, &unlimited, Resource::Interview)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_question_allowance() {
        let (store, job_posting_id) = seeded_store().await;
        let free = user(&["5_questions"]);
        for i in 0..5 {
            assert!(ensure_entitled(&store, &free, Resource::Question).await.is_ok());
            store
                .insert_question(
                    job_posting_id,
                    &format!("Question {i}"),
                    crate::models::question::QuestionDifficulty::Easy,
                )
                .await
                .unwrap();
        }
        assert!(ensure_entitled(&store, &free, Resource::Question).await.is_err());
    }
}
