use uuid::Uuid;

use crate::cache::{cached, global_tag, id_tag, invalidate, job_posting_tag, EntityKind};
use crate::errors::AppError;
use crate::models::interview::{Interview, InterviewUpdate};
use crate::state::AppState;

pub async fn get_interview(state: &AppState, id: Uuid) -> Result<Option<Interview>, AppError> {
    cached(
        state.cache.as_ref(),
        &format!("interview:{id}"),
        &[id_tag(EntityKind::Interviews, id)],
        || state.store.get_interview(id),
    )
    .await
}

pub async fn list_completed_interviews(
    state: &AppState,
    job_posting_id: Uuid,
) -> Result<Vec<Interview>, AppError> {
    cached(
        state.cache.as_ref(),
        &format!("interviews:job_posting:{job_posting_id}"),
        &[job_posting_tag(EntityKind::Interviews, job_posting_id)],
        || state.store.list_completed_interviews(job_posting_id),
    )
    .await
}

pub async fn insert_interview(
    state: &AppState,
    job_posting_id: Uuid,
    duration: &str,
) -> Result<Interview, AppError> {
    let interview = state.store.insert_interview(job_posting_id, duration).await?;
    revalidate(state, &interview).await?;
    Ok(interview)
}

/// Applies `update` unless feedback has already been stored. The check is
/// part of the write, so two racing feedback requests cannot both land.
pub async fn update_interview(
    state: &AppState,
    id: Uuid,
    update: &InterviewUpdate,
) -> Result<Interview, AppError> {
    match state.store.update_interview(id, update).await? {
        Some(interview) => {
            revalidate(state, &interview).await?;
            Ok(interview)
        }
        None => match state.store.get_interview(id).await? {
            Some(interview) if interview.is_finalized() => Err(finalized()),
            _ => Err(AppError::Forbidden),
        },
    }
}

pub fn finalized() -> AppError {
    AppError::UnprocessableEntity(
        "Feedback has already been generated for this interview".to_string(),
    )
}

async fn revalidate(state: &AppState, interview: &Interview) -> Result<(), AppError> {
    invalidate(
        state.cache.as_ref(),
        &[
            global_tag(EntityKind::Interviews),
            job_posting_tag(EntityKind::Interviews, interview.job_posting_id),
            id_tag(EntityKind::Interviews, interview.id),
        ],
    )
    .await
}
