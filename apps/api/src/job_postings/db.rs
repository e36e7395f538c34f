use uuid::Uuid;

use crate::cache::{
    cached, global_tag, id_tag, invalidate, job_posting_tag, user_tag, CacheTag, EntityKind,
};
use crate::errors::AppError;
use crate::models::job_posting::{JobPosting, JobPostingInput};
use crate::state::AppState;
use crate::store::Cascade;

pub async fn get_job_posting(state: &AppState, id: Uuid) -> Result<Option<JobPosting>, AppError> {
    cached(
        state.cache.as_ref(),
        &format!("job_posting:{id}"),
        &[id_tag(EntityKind::JobPostings, id)],
        || state.store.get_job_posting(id),
    )
    .await
}

pub async fn list_job_postings(
    state: &AppState,
    user_id: &str,
) -> Result<Vec<JobPosting>, AppError> {
    cached(
        state.cache.as_ref(),
        &format!("job_postings:user:{user_id}"),
        &[user_tag(EntityKind::JobPostings, user_id)],
        || state.store.list_job_postings(user_id),
    )
    .await
}

pub async fn insert_job_posting(
    state: &AppState,
    user_id: &str,
    input: &JobPostingInput,
) -> Result<JobPosting, AppError> {
    let job_posting = state.store.insert_job_posting(user_id, input).await?;
    revalidate(state, &job_posting).await?;
    Ok(job_posting)
}

pub async fn update_job_posting(
    state: &AppState,
    id: Uuid,
    input: &JobPostingInput,
) -> Result<Option<JobPosting>, AppError> {
    let updated = state.store.update_job_posting(id, input).await?;
    if let Some(job_posting) = &updated {
        revalidate(state, job_posting).await?;
    }
    Ok(updated)
}

pub async fn delete_job_posting(
    state: &AppState,
    job_posting: &JobPosting,
) -> Result<Cascade, AppError> {
    let cascade = state.store.delete_job_posting(job_posting.id).await?;

    let mut tags = tags_for(job_posting);
    tags.extend(cascade_tags(&cascade));
    invalidate(state.cache.as_ref(), &tags).await?;

    Ok(cascade)
}

async fn revalidate(state: &AppState, job_posting: &JobPosting) -> Result<(), AppError> {
    invalidate(state.cache.as_ref(), &tags_for(job_posting)).await
}

fn tags_for(job_posting: &JobPosting) -> Vec<CacheTag> {
    vec![
        global_tag(EntityKind::JobPostings),
        user_tag(EntityKind::JobPostings, &job_posting.user_id),
        id_tag(EntityKind::JobPostings, job_posting.id),
    ]
}

/// Every tag a cascading delete can have made stale: the removed rows and
/// the per-job-posting lists they appeared in.
pub fn cascade_tags(cascade: &Cascade) -> Vec<CacheTag> {
    let mut tags = Vec::new();
    if !cascade.job_posting_ids.is_empty() {
        tags.push(global_tag(EntityKind::JobPostings));
    }
    if !cascade.interview_ids.is_empty() {
        tags.push(global_tag(EntityKind::Interviews));
    }
    if !cascade.question_ids.is_empty() {
        tags.push(global_tag(EntityKind::Questions));
    }
    for id in &cascade.job_posting_ids {
        tags.push(id_tag(EntityKind::JobPostings, id));
        tags.push(job_posting_tag(EntityKind::Interviews, *id));
        tags.push(job_posting_tag(EntityKind::Questions, *id));
    }
    tags.extend(
        cascade
            .interview_ids
            .iter()
            .map(|id| id_tag(EntityKind::Interviews, id)),
    );
    tags.extend(
        cascade
            .question_ids
            .iter()
            .map(|id| id_tag(EntityKind::Questions, id)),
    );
    tags
}
