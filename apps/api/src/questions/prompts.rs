// All LLM prompt constants for practice questions.

use crate::llm_client::prompts::{fill, SECOND_PERSON_INSTRUCTION};
use crate::models::job_posting::JobPosting;

/// Replace `{job_description}`, `{experience_level}` and `{job_title_line}`.
pub const QUESTION_GENERATION_SYSTEM_TEMPLATE: &str = r#"You are an AI assistant that writes technical interview questions for a specific job. Generate one realistic and relevant technical question that matches the skills the job requires, at the difficulty the user asks for.

Job information:
- Job description: `{job_description}`
- Experience level: `{experience_level}`{job_title_line}

Guidelines:
- The question must reflect the skills and technologies in the job description.
- Scope the question for the experience level.
- The user gives a difficulty of "easy", "medium" or "hard"; tailor the question to it.
- Prefer practical, real-world problems over trivia.
- It is fine to focus on a single technology or skill from the description.
- Return only the question, formatted as markdown (code blocks or bullet points where useful). Do not include the answer.
- Return exactly one question, and never repeat a previous one."#;

/// Replace `{question}`.
pub const QUESTION_FEEDBACK_SYSTEM_TEMPLATE: &str = r#"You are an expert technical interviewer. Evaluate the candidate's answer (given in the user message) to this interview question:

```
{question}
```

Instructions:
- Rate the answer from 1 to 10:
  - 10 = perfect, complete and well articulated
  - 7-9 = mostly correct, minor issues or room for optimization
  - 4-6 = partially correct or incomplete
  - 1-3 = largely incorrect or missing the point
- Give concise, constructive feedback on what was done well and what could improve. Be honest but professional.
- Include a full correct answer. Grade only the candidate's response, not your answer.

Output format (follow exactly):
## Feedback (Rating: <rating>/10)
<feedback as markdown>
---
## Correct Answer
<full correct answer as markdown>"#;

pub fn question_generation_system(job_posting: &JobPosting) -> String {
    let title_line = job_posting
        .title
        .as_deref()
        .map(|t| format!("\n- Job title: `{t}`"))
        .unwrap_or_default();
    let system = fill(
        QUESTION_GENERATION_SYSTEM_TEMPLATE,
        &[
            ("job_description", &job_posting.description),
            ("experience_level", job_posting.experience_level.as_str()),
            ("job_title_line", &title_line),
        ],
    );
    format!("{system}\n\nStop generating as soon as the question is complete.")
}

pub fn question_feedback_system(question: &str) -> String {
    let system = fill(QUESTION_FEEDBACK_SYSTEM_TEMPLATE, &[("question", question)]);
    format!("{system}\n\n{SECOND_PERSON_INSTRUCTION}")
}
