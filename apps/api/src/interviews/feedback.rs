use crate::errors::AppError;
use crate::llm_client::prompts::{fill, SECOND_PERSON_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::job_posting::JobPosting;
use crate::voice::transcript::{render, TranscriptMessage};

use super::prompts::INTERVIEW_FEEDBACK_SYSTEM_TEMPLATE;

pub fn build_system_prompt(user_name: &str, job_posting: &JobPosting) -> String {
    let system = fill(
        INTERVIEW_FEEDBACK_SYSTEM_TEMPLATE,
        &[
            ("user_name", user_name),
            ("job_title", job_posting.title.as_deref().unwrap_or("")),
            ("job_description", &job_posting.description),
            ("experience_level", job_posting.experience_level.as_str()),
        ],
    );
    format!("{system}\n- {SECOND_PERSON_INSTRUCTION}")
}

/// Markdown feedback for a finished session.
pub async fn generate_feedback(
    llm: &LlmClient,
    user_name: &str,
    job_posting: &JobPosting,
    transcript: &[TranscriptMessage],
) -> Result<String, AppError> {
    if transcript.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "This interview has no transcript to review".to_string(),
        ));
    }

    let system = build_system_prompt(user_name, job_posting);
    let response = llm.call(&render(transcript), &system).await?;
    let text = response
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Llm("feedback response had no text".to_string()))?;

    Ok(text.to_string())
}
