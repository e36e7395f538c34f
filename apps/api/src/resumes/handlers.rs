use axum::extract::{
    multipart::MultipartRejection,
    rejection::PathRejection,
    Multipart, Path, State,
};
use tracing::info;
use uuid::Uuid;

use super::analysis::{analyze_resume, ResumeAnalysis, ResumeFile};
use crate::access::verify_job_posting_access;
use crate::auth::{with_auth, ActionResult, AuthUser};
use crate::errors::AppError;
use crate::quota::{ensure_entitled, Resource};
use crate::state::AppState;

const RESUME_FIELD: &str = "resume_file";

/// POST /api/v1/job-postings/:id/resume-analysis
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    auth: Result<AuthUser, AppError>,
    path: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ActionResult<ResumeAnalysis> {
    with_auth(auth, |user| async move {
        let Path(job_posting_id) = path?;
        ensure_entitled(state.store.as_ref(), &user, Resource::ResumeAnalysis).await?;
        let job_posting = verify_job_posting_access(&state, &user.user_id, job_posting_id).await?;
        let resume = read_resume(multipart?).await?;

        let analysis = analyze_resume(&state.llm, &job_posting, &resume).await?;
        info!(
            "Analyzed resume for job posting {job_posting_id} (overall {}/10)",
            analysis.overall_score
        );
        Ok(analysis)
    })
    .await
}

async fn read_resume(mut multipart: Multipart) -> Result<ResumeFile, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return ResumeFile::new(content_type.as_deref(), bytes.to_vec());
    }
    Err(AppError::Validation(
        "Please attach your resume as resume_file".to_string(),
    ))
}
