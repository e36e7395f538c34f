use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

pub const INITIAL_DURATION: &str = "00:00:00";

/// One voice mock-interview session. `voice_chat_id` is attached once the
/// session has connected to the voice provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub job_posting_id: Uuid,
    pub duration: String,
    pub voice_chat_id: Option<String>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    /// Feedback is the last mutation an interview receives.
    pub fn is_finalized(&self) -> bool {
        self.feedback.is_some()
    }
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InterviewUpdate {
    #[serde(default)]
    pub voice_chat_id: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(skip)]
    pub feedback: Option<String>,
}

impl InterviewUpdate {
    pub fn validate(self) -> Result<Self, AppError> {
        if self.voice_chat_id.is_none() && self.duration.is_none() {
            return Err(AppError::invalid_data());
        }
        if let Some(chat_id) = &self.voice_chat_id {
            if chat_id.trim().is_empty() {
                return Err(AppError::invalid_data());
            }
        }
        if let Some(duration) = &self.duration {
            if !is_clock_duration(duration) {
                return Err(AppError::invalid_data());
            }
        }
        Ok(self)
    }
}

/// `HH:MM:SS` with minutes and seconds below 60.
fn is_clock_duration(value: &str) -> bool {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 {
        return false;
    }
    parts.iter().enumerate().all(|(i, part)| {
        part.len() == 2
            && part.chars().all(|c| c.is_ascii_digit())
            && (i == 0 || part.parse::<u8>().map(|n| n < 60).unwrap_or(false))
    })
}
