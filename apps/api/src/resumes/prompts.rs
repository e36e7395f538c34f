// All LLM prompt constants for resume analysis.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{fill, JSON_ONLY_SYSTEM, SECOND_PERSON_INSTRUCTION};
use crate::models::job_posting::JobPosting;

/// Replace `{job_description}`, `{experience_level}` and `{job_title_line}`.
pub const RESUME_ANALYSIS_SYSTEM_TEMPLATE: &str = r#"You are an expert resume reviewer and hiring advisor.

The user message contains a candidate's resume as a document. The candidate is applying for this job:

Job description:
```
{job_description}
```
Experience level: {experience_level}{job_title_line}

Evaluate the resume against the job and give structured feedback in these categories:

1. ats: how well the resume suits Applicant Tracking Systems (simple layout, standard section headings, no graphics or columns, consistent formatting).
2. job_match: how well the resume matches the job description and experience level (skills, technologies, achievements, relevance).
3. writing_and_formatting: writing quality, tone, grammar, clarity and formatting. Recommend specific wording or formatting changes that would align the resume with the job.
4. keyword_coverage: use of keywords and terminology from the job description. Name missing or well-used terms.
5. other: anything else relevant (missing contact details, outdated technologies, red flags, career gaps).

Return a JSON object with this EXACT schema (no extra fields):
{
  "overall_score": 7,
  "ats": {
    "score": 8,
    "summary": "Short, high-level summary",
    "feedback": [
      {"type": "strength", "name": "Label", "message": "Specific explanation or recommendation"}
    ]
  },
  "job_match": { ... same shape ... },
  "writing_and_formatting": { ... same shape ... },
  "keyword_coverage": { ... same shape ... },
  "other": { ... same shape ... }
}

Rules:
- Every score is an integer from 1 to 10.
- "type" is one of "strength", "minor-improvement" or "major-improvement".
- Tailor the feedback to the job description and experience level. It is fine to be critical."#;

pub fn resume_analysis_system(job_posting: &JobPosting) -> String {
    let title_line = job_posting
        .title
        .as_deref()
        .map(|t| format!("\nJob title: {t}"))
        .unwrap_or_default();
    let system = fill(
        RESUME_ANALYSIS_SYSTEM_TEMPLATE,
        &[
            ("job_description", &job_posting.description),
            ("experience_level", job_posting.experience_level.as_str()),
            ("job_title_line", &title_line),
        ],
    );
    format!("{system}\n- {SECOND_PERSON_INSTRUCTION}\n\n{JSON_ONLY_SYSTEM}")
}
