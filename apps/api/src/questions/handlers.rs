use std::convert::Infallible;

use async_stream::stream;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{db, prompts};
use crate::access::{verify_job_posting_access, verify_question_access};
use crate::auth::AuthUser;
use crate::errors::{AppError, UPSTREAM_MESSAGE};
use crate::llm_client::{Message, TokenStream};
use crate::models::question::{Question, QuestionDifficulty};
use crate::quota::{ensure_entitled, Resource};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateQuestionRequest {
    pub difficulty: QuestionDifficulty,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

/// GET /api/v1/job-postings/:id/questions
pub async fn handle_list_questions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_posting_id): Path<Uuid>,
) -> Result<Json<Vec<Question>>, AppError> {
    verify_job_posting_access(&state, &user.user_id, job_posting_id).await?;
    Ok(Json(db::list_questions(&state, job_posting_id).await?))
}

/// POST /api/v1/job-postings/:id/questions
///
/// Streams `delta` events while the question is written, then stores it and
/// sends `done` with the saved row. Nothing is stored if the stream fails
/// or the client goes away first.
pub async fn handle_generate_question(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_posting_id): Path<Uuid>,
    payload: Result<Json<GenerateQuestionRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    ensure_entitled(state.store.as_ref(), &user, Resource::Question).await?;
    let job_posting = verify_job_posting_access(&state, &user.user_id, job_posting_id).await?;
    let Json(request) = payload?;

    let previous = db::list_questions(&state, job_posting_id).await?;
    let system = prompts::question_generation_system(&job_posting);
    let tokens = state
        .llm
        .stream(&system, &history(&previous, request.difficulty))
        .await?;

    let events = question_events(state, job_posting_id, request.difficulty, tokens);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// POST /api/v1/questions/:id/feedback
pub async fn handle_question_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(question_id): Path<Uuid>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let (question, _) = verify_question_access(&state, &user.user_id, question_id).await?;
    let Json(request) = payload?;
    let answer = request.answer.trim();
    if answer.is_empty() {
        return Err(AppError::invalid_data());
    }

    let system = prompts::question_feedback_system(&question.text);
    let tokens = state.llm.stream(&system, &[Message::user(answer)]).await?;

    Ok(Sse::new(feedback_events(tokens)).keep_alive(KeepAlive::default()))
}

/// Previous questions replayed as alternating turns (difficulty, then the
/// question) so the model does not repeat itself.
fn history(previous: &[Question], difficulty: QuestionDifficulty) -> Vec<Message> {
    previous
        .iter()
        .flat_map(|q| {
            [
                Message::user(q.difficulty.as_str()),
                Message::assistant(q.text.clone()),
            ]
        })
        .chain(std::iter::once(Message::user(difficulty.as_str())))
        .collect()
}

#[derive(Serialize)]
struct Delta<'a> {
    text: &'a str,
}

fn question_events(
    state: AppState,
    job_posting_id: Uuid,
    difficulty: QuestionDifficulty,
    mut tokens: TokenStream,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream! {
        let mut text = String::new();
        while let Some(delta) = tokens.next().await {
            match delta {
                Ok(delta) => {
                    text.push_str(&delta);
                    yield Ok(sse_event("delta", &Delta { text: &delta }));
                }
                Err(e) => {
                    yield Ok(error_event(e.into()));
                    return;
                }
            }
        }

        let text = text.trim();
        if text.is_empty() {
            yield Ok(error_event(AppError::Llm("question stream was empty".to_string())));
            return;
        }

        match db::insert_question(&state, job_posting_id, text, difficulty).await {
            Ok(question) => {
                info!("Generated question {} under {job_posting_id}", question.id);
                yield Ok(sse_event("done", &question));
            }
            Err(e) => yield Ok(error_event(e)),
        }
    }
}

fn feedback_events(mut tokens: TokenStream) -> impl Stream<Item = Result<Event, Infallible>> {
    stream! {
        let mut text = String::new();
        while let Some(delta) = tokens.next().await {
            match delta {
                Ok(delta) => {
                    text.push_str(&delta);
                    yield Ok(sse_event("delta", &Delta { text: &delta }));
                }
                Err(e) => {
                    yield Ok(error_event(e.into()));
                    return;
                }
            }
        }
        yield Ok(sse_event("done", &Delta { text: &text }));
    }
}

fn sse_event<T: Serialize>(name: &str, data: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(data)
        .unwrap_or_else(|e| {
            error!("Could not encode {name} event: {e}");
            Event::default()
                .event("error")
                .data(json!({ "message": UPSTREAM_MESSAGE }).to_string())
        })
}

/// Mid-stream failures cannot change the response status, so they travel
/// as an `error` event carrying the public message.
fn error_event(err: AppError) -> Event {
    let (_, code, message) = err.public_parts();
    warn!("Ending stream with {code}");
    sse_event("error", &json!({ "code": code, "message": message }))
}
