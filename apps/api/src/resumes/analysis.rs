use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::prompts;
use crate::errors::AppError;
use crate::llm_client::{ContentPart, DocumentSource, LlmClient, Message, Role};
use crate::models::job_posting::JobPosting;

pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    PlainText,
    Markdown,
}

impl ResumeFormat {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Some(ResumeFormat::Pdf),
            "text/plain" => Some(ResumeFormat::PlainText),
            "text/markdown" => Some(ResumeFormat::Markdown),
            _ => None,
        }
    }
}

/// An uploaded resume that passed the type and size checks.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub format: ResumeFormat,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(content_type: Option<&str>, bytes: Vec<u8>) -> Result<Self, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("The resume file is empty".to_string()));
        }
        if bytes.len() > MAX_RESUME_BYTES {
            return Err(AppError::Validation(
                "File size must be less than 10MB".to_string(),
            ));
        }
        let format = content_type
            .and_then(ResumeFormat::from_content_type)
            .ok_or_else(|| {
                AppError::Validation(
                    "Please upload a PDF, plain text or Markdown file".to_string(),
                )
            })?;
        Ok(Self { format, bytes })
    }

    /// The file as a document content block.
    pub fn to_content(&self) -> Result<ContentPart, AppError> {
        let source = match self.format {
            ResumeFormat::Pdf => DocumentSource::Base64 {
                media_type: "application/pdf".to_string(),
                data: STANDARD.encode(&self.bytes),
            },
            ResumeFormat::PlainText | ResumeFormat::Markdown => DocumentSource::Text {
                media_type: "text/plain".to_string(),
                data: String::from_utf8(self.bytes.clone()).map_err(|_| {
                    AppError::Validation("Text resumes must be UTF-8 encoded".to_string())
                })?,
            },
        };
        Ok(ContentPart::Document { source })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackKind {
    Strength,
    MinorImprovement,
    MajorImprovement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    pub score: u8,
    pub summary: String,
    #[serde(default)]
    pub feedback: Vec<FeedbackItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    pub overall_score: u8,
    pub ats: CategoryAnalysis,
    pub job_match: CategoryAnalysis,
    pub writing_and_formatting: CategoryAnalysis,
    pub keyword_coverage: CategoryAnalysis,
    pub other: CategoryAnalysis,
}

impl ResumeAnalysis {
    /// Every score must lie in 1..=10; anything else is a broken response.
    pub fn validate(self) -> Result<Self, AppError> {
        let scores = [
            ("overall_score", self.overall_score),
            ("ats", self.ats.score),
            ("job_match", self.job_match.score),
            ("writing_and_formatting", self.writing_and_formatting.score),
            ("keyword_coverage", self.keyword_coverage.score),
            ("other", self.other.score),
        ];
        if let Some((field, score)) = scores.iter().find(|(_, s)| !(1..=10).contains(s)) {
            return Err(AppError::Llm(format!(
                "resume analysis {field} score {score} is out of range"
            )));
        }
        Ok(self)
    }
}

pub async fn analyze_resume(
    llm: &LlmClient,
    job_posting: &JobPosting,
    resume: &ResumeFile,
) -> Result<ResumeAnalysis, AppError> {
    let system = prompts::resume_analysis_system(job_posting);
    let messages = [Message {
        role: Role::User,
        content: vec![resume.to_content()?],
    }];

    let analysis: ResumeAnalysis = llm.complete_json(&system, &messages).await?;
    analysis.validate()
}
