use crate::cache::{cached, global_tag, id_tag, invalidate, user_tag, EntityKind};
use crate::errors::AppError;
use crate::job_postings::db::cascade_tags;
use crate::models::user::{UpsertUser, User};
use crate::state::AppState;
use crate::store::Cascade;

pub async fn get_user(state: &AppState, id: &str) -> Result<Option<User>, AppError> {
    cached(
        state.cache.as_ref(),
        &format!("user:{id}"),
        &[id_tag(EntityKind::Users, id)],
        || state.store.get_user(id),
    )
    .await
}

pub async fn upsert_user(state: &AppState, user: &UpsertUser) -> Result<(), AppError> {
    state.store.upsert_user(user).await?;
    invalidate(
        state.cache.as_ref(),
        &[
            global_tag(EntityKind::Users),
            id_tag(EntityKind::Users, &user.id),
        ],
    )
    .await
}

pub async fn delete_user(state: &AppState, id: &str) -> Result<Cascade, AppError> {
    let cascade = state.store.delete_user(id).await?;

    let mut tags = vec![
        global_tag(EntityKind::Users),
        id_tag(EntityKind::Users, id),
        user_tag(EntityKind::JobPostings, id),
    ];
    tags.extend(cascade_tags(&cascade));
    invalidate(state.cache.as_ref(), &tags).await?;

    Ok(cascade)
}
