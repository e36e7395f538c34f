use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{db, feedback};
use crate::access::{verify_interview_access, verify_job_posting_access};
use crate::auth::{with_auth, ActionResult, AuthUser};
use crate::cache::cached;
use crate::errors::AppError;
use crate::models::interview::{Interview, InterviewUpdate, INITIAL_DURATION};
use crate::quota::{ensure_entitled, Resource};
use crate::rate_limit::{enforce, INTERVIEW_CREATION};
use crate::state::AppState;
use crate::users;
use crate::voice::transcript::{self, TranscriptMessage, TranscriptTurn};

const INTERVIEW_CREATION_SCOPE: &str = "interview_creation";

/// GET /api/v1/job-postings/:id/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_posting_id): Path<Uuid>,
) -> Result<Json<Vec<Interview>>, AppError> {
    verify_job_posting_access(&state, &user.user_id, job_posting_id).await?;
    Ok(Json(
        db::list_completed_interviews(&state, job_posting_id).await?,
    ))
}

/// POST /api/v1/job-postings/:id/interviews
///
/// Checks run in order: identity, plan quota, ownership, rate limit. A
/// request denied at any step writes nothing and spends no rate budget.
pub async fn handle_create_interview(
    State(state): State<AppState>,
    auth: Result<AuthUser, AppError>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ActionResult<Interview> {
    with_auth(auth, |user| async move {
        let Path(job_posting_id) = path?;
        ensure_entitled(state.store.as_ref(), &user, Resource::Interview).await?;
        verify_job_posting_access(&state, &user.user_id, job_posting_id).await?;
        enforce(
            state.rate_limiter.as_ref(),
            INTERVIEW_CREATION_SCOPE,
            &user.user_id,
            &INTERVIEW_CREATION,
        )
        .await?;

        let interview = db::insert_interview(&state, job_posting_id, INITIAL_DURATION).await?;
        info!("Started interview {} under {job_posting_id}", interview.id);
        Ok(interview)
    })
    .await
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Interview>, AppError> {
    let (interview, _) = verify_interview_access(&state, &user.user_id, id).await?;
    Ok(Json(interview))
}

/// PATCH /api/v1/interviews/:id
pub async fn handle_update_interview(
    State(state): State<AppState>,
    auth: Result<AuthUser, AppError>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<InterviewUpdate>, JsonRejection>,
) -> ActionResult<Interview> {
    with_auth(auth, |user| async move {
        let Path(id) = path?;
        let (interview, _) = verify_interview_access(&state, &user.user_id, id).await?;
        if interview.is_finalized() {
            return Err(db::finalized());
        }
        let Json(update) = payload?;
        let update = update.validate()?;

        let interview = db::update_interview(&state, id, &update).await?;
        info!("Updated interview {id} (duration {})", interview.duration);
        Ok(interview)
    })
    .await
}

#[derive(Serialize)]
pub struct TranscriptResponse {
    pub turns: Vec<TranscriptTurn>,
}

/// GET /api/v1/interviews/:id/transcript
pub async fn handle_get_transcript(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TranscriptResponse>, AppError> {
    let (interview, _) = verify_interview_access(&state, &user.user_id, id).await?;
    let chat_id = interview.voice_chat_id.ok_or_else(not_connected)?;
    let messages = fetch_transcript(&state, &chat_id).await?;
    Ok(Json(TranscriptResponse {
        turns: transcript::condense(&messages),
    }))
}

/// POST /api/v1/interviews/:id/feedback
pub async fn handle_generate_feedback(
    State(state): State<AppState>,
    auth: Result<AuthUser, AppError>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ActionResult<Interview> {
    with_auth(auth, |user| async move {
        let Path(id) = path?;
        let (interview, job_posting) = verify_interview_access(&state, &user.user_id, id).await?;
        if interview.is_finalized() {
            return Err(db::finalized());
        }
        let chat_id = interview.voice_chat_id.ok_or_else(not_connected)?;
        let profile = users::db::get_user(&state, &user.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let messages = fetch_transcript(&state, &chat_id).await?;
        let text =
            feedback::generate_feedback(&state.llm, &profile.name, &job_posting, &messages).await?;

        let update = InterviewUpdate {
            feedback: Some(text),
            ..Default::default()
        };
        let interview = db::update_interview(&state, id, &update).await?;
        info!("Stored feedback for interview {id}");
        Ok(interview)
    })
    .await
}

/// Transcripts never change once a chat has ended, so they are cached
/// without tags.
async fn fetch_transcript(
    state: &AppState,
    chat_id: &str,
) -> Result<Vec<TranscriptMessage>, AppError> {
    cached(
        state.cache.as_ref(),
        &format!("transcript:{chat_id}"),
        &[],
        || async {
            let events = state.voice.fetch_chat_events(chat_id).await?;
            Ok::<_, AppError>(transcript::from_events(events))
        },
    )
    .await
}

fn not_connected() -> AppError {
    AppError::UnprocessableEntity("This interview was never started".to_string())
}
