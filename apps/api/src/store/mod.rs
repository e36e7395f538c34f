//! Persistence boundary for users, job postings, interviews and questions.
//!
//! `AppState` carries an `Arc<dyn Store>`: Postgres in production, an
//! in-memory implementation under test. Stores know nothing about caching or
//! ownership; callers go through the feature `db` modules, which add both.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{Interview, InterviewUpdate};
use crate::models::job_posting::{JobPosting, JobPostingInput};
use crate::models::question::{Question, QuestionDifficulty};
use crate::models::user::{UpsertUser, User};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Rows removed by a cascading delete, captured before the delete so every
/// affected cache tag can be invalidated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cascade {
    pub job_posting_ids: Vec<Uuid>,
    pub interview_ids: Vec<Uuid>,
    pub question_ids: Vec<Uuid>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts or replaces by id. An update carrying an older `updated_at`
    /// than the stored row is ignored.
    async fn upsert_user(&self, user: &UpsertUser) -> Result<(), AppError>;
    async fn delete_user(&self, id: &str) -> Result<Cascade, AppError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn insert_job_posting(
        &self,
        user_id: &str,
        input: &JobPostingInput,
    ) -> Result<JobPosting, AppError>;
    async fn update_job_posting(
        &self,
        id: Uuid,
        input: &JobPostingInput,
    ) -> Result<Option<JobPosting>, AppError>;
    async fn delete_job_posting(&self, id: Uuid) -> Result<Cascade, AppError>;
    async fn get_job_posting(&self, id: Uuid) -> Result<Option<JobPosting>, AppError>;
    /// Newest first.
    async fn list_job_postings(&self, user_id: &str) -> Result<Vec<JobPosting>, AppError>;

    async fn insert_interview(
        &self,
        job_posting_id: Uuid,
        duration: &str,
    ) -> Result<Interview, AppError>;
    /// Returns `None` when the interview is gone or already has feedback;
    /// the feedback check is part of the same write.
    async fn update_interview(
        &self,
        id: Uuid,
        update: &InterviewUpdate,
    ) -> Result<Option<Interview>, AppError>;
    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, AppError>;
    /// Sessions that reached the voice provider, newest first.
    async fn list_completed_interviews(
        &self,
        job_posting_id: Uuid,
    ) -> Result<Vec<Interview>, AppError>;
    /// Interviews across all of the user's job postings that carry a voice
    /// chat id. Sessions that never connected are not counted.
    async fn count_completed_interviews(&self, user_id: &str) -> Result<i64, AppError>;

    async fn insert_question(
        &self,
        job_posting_id: Uuid,
        text: &str,
        difficulty: QuestionDifficulty,
    ) -> Result<Question, AppError>;
    async fn get_question(&self, id: Uuid) -> Result<Option<Question>, AppError>;
    /// Oldest first, so the list doubles as conversation history.
    async fn list_questions(&self, job_posting_id: Uuid) -> Result<Vec<Question>, AppError>;
    async fn count_questions(&self, user_id: &str) -> Result<i64, AppError>;
}
