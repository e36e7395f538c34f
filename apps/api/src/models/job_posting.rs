use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_level", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ExperienceLevel {
    Junior,
    MidLevel,
    Senior,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::MidLevel => "mid-level",
            ExperienceLevel::Senior => "senior",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub title: Option<String>,
    pub description: String,
    pub experience_level: ExperienceLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied fields for creating or replacing a job posting.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPostingInput {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    pub description: String,
    pub experience_level: ExperienceLevel,
}

impl JobPostingInput {
    /// Trims text fields; blank required fields are rejected and a blank
    /// title is treated as absent.
    pub fn validate(self) -> Result<Self, AppError> {
        let name = self.name.trim().to_string();
        let description = self.description.trim().to_string();
        if name.is_empty() || description.is_empty() {
            return Err(AppError::invalid_data());
        }
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(JobPostingInput {
            name,
            title,
            description,
            experience_level: self.experience_level,
        })
    }
}
