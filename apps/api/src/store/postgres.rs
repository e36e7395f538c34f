use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Cascade, Store};
use crate::errors::AppError;
use crate::models::interview::{Interview, InterviewUpdate};
use crate::models::job_posting::{JobPosting, JobPostingInput};
use crate::models::question::{Question, QuestionDifficulty};
use crate::models::user::{UpsertUser, User};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_user(&self, user: &UpsertUser) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                image_url = EXCLUDED.image_url,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at
            WHERE users.updated_at <= EXCLUDED.updated_at
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image_url)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<Cascade, AppError> {
        let mut tx = self.pool.begin().await?;

        let job_posting_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM job_postings WHERE user_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        let interview_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT i.id FROM interviews i
            JOIN job_postings j ON j.id = i.job_posting_id
            WHERE j.user_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        let question_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT q.id FROM questions q
            JOIN job_postings j ON j.id = q.job_posting_id
            WHERE j.user_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Cascade {
            job_posting_ids,
            interview_ids,
            question_ids,
        })
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_job_posting(
        &self,
        user_id: &str,
        input: &JobPostingInput,
    ) -> Result<JobPosting, AppError> {
        Ok(sqlx::query_as::<_, JobPosting>(
            r#"
            INSERT INTO job_postings (user_id, name, title, description, experience_level)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.experience_level)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_job_posting(
        &self,
        id: Uuid,
        input: &JobPostingInput,
    ) -> Result<Option<JobPosting>, AppError> {
        Ok(sqlx::query_as::<_, JobPosting>(
            r#"
            UPDATE job_postings
            SET name = $2, title = $3, description = $4, experience_level = $5, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.experience_level)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_job_posting(&self, id: Uuid) -> Result<Cascade, AppError> {
        let mut tx = self.pool.begin().await?;

        let interview_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM interviews WHERE job_posting_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        let question_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM questions WHERE job_posting_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        let deleted = sqlx::query("DELETE FROM job_postings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Cascade {
            job_posting_ids: if deleted.rows_affected() > 0 {
                vec![id]
            } else {
                vec![]
            },
            interview_ids,
            question_ids,
        })
    }

    async fn get_job_posting(&self, id: Uuid) -> Result<Option<JobPosting>, AppError> {
        Ok(
            sqlx::query_as::<_, JobPosting>("SELECT * FROM job_postings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_job_postings(&self, user_id: &str) -> Result<Vec<JobPosting>, AppError> {
        Ok(sqlx::query_as::<_, JobPosting>(
            "SELECT * FROM job_postings WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_interview(
        &self,
        job_posting_id: Uuid,
        duration: &str,
    ) -> Result<Interview, AppError> {
        Ok(sqlx::query_as::<_, Interview>(
            "INSERT INTO interviews (job_posting_id, duration) VALUES ($1, $2) RETURNING *",
        )
        .bind(job_posting_id)
        .bind(duration)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_interview(
        &self,
        id: Uuid,
        update: &InterviewUpdate,
    ) -> Result<Option<Interview>, AppError> {
        Ok(sqlx::query_as::<_, Interview>(
            r#"
            UPDATE interviews
            SET voice_chat_id = COALESCE($2, voice_chat_id),
                duration = COALESCE($3, duration),
                feedback = COALESCE($4, feedback),
                updated_at = now()
            WHERE id = $1 AND feedback IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.voice_chat_id)
        .bind(&update.duration)
        .bind(&update.feedback)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, AppError> {
        Ok(
            sqlx::query_as::<_, Interview>("SELECT * FROM interviews WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_completed_interviews(
        &self,
        job_posting_id: Uuid,
    ) -> Result<Vec<Interview>, AppError> {
        Ok(sqlx::query_as::<_, Interview>(
            r#"
            SELECT * FROM interviews
            WHERE job_posting_id = $1 AND voice_chat_id IS NOT NULL
            ORDER BY updated_at DESC
            "#,
        )
        .bind(job_posting_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count_completed_interviews(&self, user_id: &str) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM interviews i
            JOIN job_postings j ON j.id = i.job_posting_id
            WHERE j.user_id = $1 AND i.voice_chat_id IS NOT NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn insert_question(
        &self,
        job_posting_id: Uuid,
        text: &str,
        difficulty: QuestionDifficulty,
    ) -> Result<Question, AppError> {
        Ok(sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (job_posting_id, text, difficulty)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(job_posting_id)
        .bind(text)
        .bind(difficulty)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<Question>, AppError> {
        Ok(
            sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_questions(&self, job_posting_id: Uuid) -> Result<Vec<Question>, AppError> {
        Ok(sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE job_posting_id = $1 ORDER BY created_at ASC",
        )
        .bind(job_posting_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count_questions(&self, user_id: &str) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM questions q
            JOIN job_postings j ON j.id = q.job_posting_id
            WHERE j.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }
}
