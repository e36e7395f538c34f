use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Cascade, Store};
use crate::errors::AppError;
use crate::models::interview::{Interview, InterviewUpdate};
use crate::models::job_posting::{JobPosting, JobPostingInput};
use crate::models::question::{Question, QuestionDifficulty};
use crate::models::user::{UpsertUser, User};

/// Test store with the same cascade and ordering rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    job_postings: Vec<JobPosting>,
    interviews: Vec<Interview>,
    questions: Vec<Question>,
}

impl Tables {
    fn cascade_job_posting(&mut self, id: Uuid, cascade: &mut Cascade) {
        let before = self.job_postings.len();
        self.job_postings.retain(|j| j.id != id);
        if self.job_postings.len() != before {
            cascade.job_posting_ids.push(id);
        }
        self.interviews.retain(|i| {
            let keep = i.job_posting_id != id;
            if !keep {
                cascade.interview_ids.push(i.id);
            }
            keep
        });
        self.questions.retain(|q| {
            let keep = q.job_posting_id != id;
            if !keep {
                cascade.question_ids.push(q.id);
            }
            keep
        });
    }

    fn owner_job_posting_ids(&self, user_id: &str) -> Vec<Uuid> {
        self.job_postings
            .iter()
            .filter(|j| j.user_id == user_id)
            .map(|j| j.id)
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_user(&self, user: &UpsertUser) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "duplicate key value violates unique constraint \"users_email_key\""
            )));
        }
        let row = User {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            image_url: user.image_url.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        };
        match t.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) if existing.updated_at <= user.updated_at => *existing = row,
            Some(_) => {}
            None => t.users.push(row),
        }
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<Cascade, AppError> {
        let mut t = self.tables.lock().unwrap();
        let mut cascade = Cascade::default();
        for job_posting_id in t.owner_job_posting_ids(id) {
            t.cascade_job_posting(job_posting_id, &mut cascade);
        }
        t.users.retain(|u| u.id != id);
        Ok(cascade)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_job_posting(
        &self,
        user_id: &str,
        input: &JobPostingInput,
    ) -> Result<JobPosting, AppError> {
        let mut t = self.tables.lock().unwrap();
        if !t.users.iter().any(|u| u.id == user_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "insert violates foreign key constraint on job_postings.user_id"
            )));
        }
        let now = Utc::now();
        let row = JobPosting {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: input.name.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            experience_level: input.experience_level,
            created_at: now,
            updated_at: now,
        };
        t.job_postings.push(row.clone());
        Ok(row)
    }

    async fn update_job_posting(
        &self,
        id: Uuid,
        input: &JobPostingInput,
    ) -> Result<Option<JobPosting>, AppError> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.job_postings.iter_mut().find(|j| j.id == id).map(|j| {
            j.name = input.name.clone();
            j.title = input.title.clone();
            j.description = input.description.clone();
            j.experience_level = input.experience_level;
            j.updated_at = Utc::now();
            j.clone()
        }))
    }

    async fn delete_job_posting(&self, id: Uuid) -> Result<Cascade, AppError> {
        let mut t = self.tables.lock().unwrap();
        let mut cascade = Cascade::default();
        t.cascade_job_posting(id, &mut cascade);
        Ok(cascade)
    }

    async fn get_job_posting(&self, id: Uuid) -> Result<Option<JobPosting>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.job_postings.iter().find(|j| j.id == id).cloned())
    }

    async fn list_job_postings(&self, user_id: &str) -> Result<Vec<JobPosting>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.job_postings
            .iter()
            .rev()
            .filter(|j| j.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_interview(
        &self,
        job_posting_id: Uuid,
        duration: &str,
    ) -> Result<Interview, AppError> {
        let mut t = self.tables.lock().unwrap();
        if !t.job_postings.iter().any(|j| j.id == job_posting_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "insert violates foreign key constraint on interviews.job_posting_id"
            )));
        }
        let now = Utc::now();
        let row = Interview {
            id: Uuid::new_v4(),
            job_posting_id,
            duration: duration.to_string(),
            voice_chat_id: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        };
        t.interviews.push(row.clone());
        Ok(row)
    }

    async fn update_interview(
        &self,
        id: Uuid,
        update: &InterviewUpdate,
    ) -> Result<Option<Interview>, AppError> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.interviews
            .iter_mut()
            .find(|i| i.id == id && i.feedback.is_none())
            .map(|i| {
                if let Some(chat_id) = &update.voice_chat_id {
                    i.voice_chat_id = Some(chat_id.clone());
                }
                if let Some(duration) = &update.duration {
                    i.duration = duration.clone();
                }
                if let Some(feedback) = &update.feedback {
                    i.feedback = Some(feedback.clone());
                }
                i.updated_at = Utc::now();
                i.clone()
            }))
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.interviews.iter().find(|i| i.id == id).cloned())
    }

    async fn list_completed_interviews(
        &self,
        job_posting_id: Uuid,
    ) -> Result<Vec<Interview>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.interviews
            .iter()
            .rev()
            .filter(|i| i.job_posting_id == job_posting_id && i.voice_chat_id.is_some())
            .cloned()
            .collect())
    }

    async fn count_completed_interviews(&self, user_id: &str) -> Result<i64, AppError> {
        let t = self.tables.lock().unwrap();
        let owned = t.owner_job_posting_ids(user_id);
        Ok(t.interviews
            .iter()
            .filter(|i| owned.contains(&i.job_posting_id) && i.voice_chat_id.is_some())
            .count() as i64)
    }

    async fn insert_question(
        &self,
        job_posting_id: Uuid,
        text: &str,
        difficulty: QuestionDifficulty,
    ) -> Result<Question, AppError> {
        let mut t = self.tables.lock().unwrap();
        if !t.job_postings.iter().any(|j| j.id == job_posting_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "insert violates foreign key constraint on questions.job_posting_id"
            )));
        }
        let now = Utc::now();
        let row = Question {
            id: Uuid::new_v4(),
            job_posting_id,
            text: text.to_string(),
            difficulty,
            created_at: now,
            updated_at: now,
        };
        t.questions.push(row.clone());
        Ok(row)
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<Question>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn list_questions(&self, job_posting_id: Uuid) -> Result<Vec<Question>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.questions
            .iter()
            .filter(|q| q.job_posting_id == job_posting_id)
            .cloned()
            .collect())
    }

    async fn count_questions(&self, user_id: &str) -> Result<i64, AppError> {
        let t = self.tables.lock().unwrap();
        let owned = t.owner_job_posting_ids(user_id);
        Ok(t.questions
            .iter()
            .filter(|q| owned.contains(&q.job_posting_id))
            .count() as i64)
    }
}
