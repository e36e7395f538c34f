use uuid::Uuid;

use crate::cache::{cached, global_tag, id_tag, invalidate, job_posting_tag, EntityKind};
use crate::errors::AppError;
use crate::models::question::{Question, QuestionDifficulty};
use crate::state::AppState;

pub async fn get_question(state: &AppState, id: Uuid) -> Result<Option<Question>, AppError> {
    cached(
        state.cache.as_ref(),
        &format!("question:{id}"),
        &[id_tag(EntityKind::Questions, id)],
        || state.store.get_question(id),
    )
    .await
}

pub async fn list_questions(
    state: &AppState,
    job_posting_id: Uuid,
) -> Result<Vec<Question>, AppError> {
    cached(
        state.cache.as_ref(),
        &format!("questions:job_posting:{job_posting_id}"),
        &[job_posting_tag(EntityKind::Questions, job_posting_id)],
        || state.store.list_questions(job_posting_id),
    )
    .await
}

pub async fn insert_question(
    state: &AppState,
    job_posting_id: Uuid,
    text: &str,
    difficulty: QuestionDifficulty,
) -> Result<Question, AppError> {
    let question = state
        .store
        .insert_question(job_posting_id, text, difficulty)
        .await?;
    invalidate(
        state.cache.as_ref(),
        &[
            global_tag(EntityKind::Questions),
            job_posting_tag(EntityKind::Questions, job_posting_id),
            id_tag(EntityKind::Questions, question.id),
        ],
    )
    .await?;
    Ok(question)
}
