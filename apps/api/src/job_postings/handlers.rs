use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use tracing::info;
use uuid::Uuid;

use super::db;
use crate::access::verify_job_posting_access;
use crate::auth::{with_auth, ActionResult, AuthUser};
use crate::errors::AppError;
use crate::models::job_posting::{JobPosting, JobPostingInput};
use crate::state::AppState;
use crate::users;

/// GET /api/v1/job-postings
pub async fn handle_list_job_postings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    Ok(Json(db::list_job_postings(&state, &user.user_id).await?))
}

/// POST /api/v1/job-postings
pub async fn handle_create_job_posting(
    State(state): State<AppState>,
    auth: Result<AuthUser, AppError>,
    payload: Result<Json<JobPostingInput>, JsonRejection>,
) -> ActionResult<JobPosting> {
    with_auth(auth, |user| async move {
        let Json(input) = payload?;
        let input = input.validate()?;

        if users::db::get_user(&state, &user.user_id).await?.is_none() {
            return Err(AppError::UnprocessableEntity(
                "Your account is still being set up. Please try again shortly.".to_string(),
            ));
        }

        let job_posting = db::insert_job_posting(&state, &user.user_id, &input).await?;
        info!("Created job posting {} for {}", job_posting.id, user.user_id);
        Ok(job_posting)
    })
    .await
}

/// GET /api/v1/job-postings/:id
pub async fn handle_get_job_posting(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<JobPosting>, AppError> {
    Ok(Json(
        verify_job_posting_access(&state, &user.user_id, id).await?,
    ))
}

/// PUT /api/v1/job-postings/:id
pub async fn handle_update_job_posting(
    State(state): State<AppState>,
    auth: Result<AuthUser, AppError>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<JobPostingInput>, JsonRejection>,
) -> ActionResult<JobPosting> {
    with_auth(auth, |user| async move {
        let Path(id) = path?;
        verify_job_posting_access(&state, &user.user_id, id).await?;
        let Json(input) = payload?;
        let input = input.validate()?;

        let job_posting = db::update_job_posting(&state, id, &input)
            .await?
            .ok_or(AppError::Forbidden)?;
        info!("Updated job posting {id}");
        Ok(job_posting)
    })
    .await
}

/// DELETE /api/v1/job-postings/:id
pub async fn handle_delete_job_posting(
    State(state): State<AppState>,
    auth: Result<AuthUser, AppError>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ActionResult<JobPosting> {
    with_auth(auth, |user| async move {
        let Path(id) = path?;
        let job_posting = verify_job_posting_access(&state, &user.user_id, id).await?;
        let cascade = db::delete_job_posting(&state, &job_posting).await?;
        info!(
            "Deleted job posting {id} ({} interviews, {} questions)",
            cascade.interview_ids.len(),
            cascade.question_ids.len()
        );
        Ok(job_posting)
    })
    .await
}
