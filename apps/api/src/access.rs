//! Ownership checks along User -> Job Posting -> {Interview, Question}.
//!
//! A missing resource and one owned by someone else both fail with
//! `Forbidden`, so callers cannot probe for ids. Lookups go through the
//! cached reads; the owner comparison itself is never cached.

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::Interview;
use crate::models::job_posting::JobPosting;
use crate::models::question::Question;
use crate::state::AppState;
use crate::{interviews, job_postings, questions};

pub async fn verify_job_posting_access(
    state: &AppState,
    user_id: &str,
    job_posting_id: Uuid,
) -> Result<JobPosting, AppError> {
    match job_postings::db::get_job_posting(state, job_posting_id).await? {
        Some(job_posting) if job_posting.user_id == user_id => Ok(job_posting),
        _ => Err(AppError::Forbidden),
    }
}

pub async fn verify_interview_access(
    state: &AppState,
    user_id: &str,
    interview_id: Uuid,
) -> Result<(Interview, JobPosting), AppError> {
    let interview = interviews::db::get_interview(state, interview_id)
        .await?
        .ok_or(AppError::Forbidden)?;
    let job_posting = verify_job_posting_access(state, user_id, interview.job_posting_id).await?;
    Ok((interview, job_posting))
}

pub async fn verify_question_access(
    state: &AppState,
    user_id: &str,
    question_id: Uuid,
) -> Result<(Question, JobPosting), AppError> {
    let question = questions::db::get_question(state, question_id)
        .await?
        .ok_or(AppError::Forbidden)?;
    let job_posting = verify_job_posting_access(state, user_id, question.job_posting_id).await?;
    Ok((question, job_posting))
}
