pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::resumes::analysis::MAX_RESUME_BYTES;
use crate::state::AppState;
use crate::{interviews, job_postings, questions, resumes, users, voice};

/// Room for multipart framing around a maximum-size resume, so oversized
/// files reach the size check and get its message.
const RESUME_BODY_LIMIT: usize = MAX_RESUME_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/webhooks/identity",
            post(users::handlers::handle_identity_webhook),
        )
        .route("/api/v1/me", get(users::handlers::handle_me))
        .route(
            "/api/v1/voice/token",
            post(voice::handlers::handle_voice_token),
        )
        // Job postings
        .route(
            "/api/v1/job-postings",
            get(job_postings::handlers::handle_list_job_postings)
                .post(job_postings::handlers::handle_create_job_posting),
        )
        .route(
            "/api/v1/job-postings/:id",
            get(job_postings::handlers::handle_get_job_posting)
                .put(job_postings::handlers::handle_update_job_posting)
                .delete(job_postings::handlers::handle_delete_job_posting),
        )
        // Interviews
        .route(
            "/api/v1/job-postings/:id/interviews",
            get(interviews::handlers::handle_list_interviews)
                .post(interviews::handlers::handle_create_interview),
        )
        .route(
            "/api/v1/interviews/:id",
            get(interviews::handlers::handle_get_interview)
                .patch(interviews::handlers::handle_update_interview),
        )
        .route(
            "/api/v1/interviews/:id/transcript",
            get(interviews::handlers::handle_get_transcript),
        )
        .route(
            "/api/v1/interviews/:id/feedback",
            post(interviews::handlers::handle_generate_feedback),
        )
        // Questions
        .route(
            "/api/v1/job-postings/:id/questions",
            get(questions::handlers::handle_list_questions)
                .post(questions::handlers::handle_generate_question),
        )
        .route(
            "/api/v1/questions/:id/feedback",
            post(questions::handlers::handle_question_feedback),
        )
        // Resumes
        .route(
            "/api/v1/job-postings/:id/resume-analysis",
            post(resumes::handlers::handle_analyze_resume)
                .layer(DefaultBodyLimit::max(RESUME_BODY_LIMIT)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::session::test_tokens;
    use crate::errors::{INVALID_DATA_MESSAGE, PERMISSION_MESSAGE, PLAN_LIMIT_MESSAGE, RATE_LIMIT_MESSAGE};
    use crate::models::interview::InterviewUpdate;
    use crate::models::question::QuestionDifficulty;
    use crate::state::test_state;
    use crate::users::webhook::fixtures;

    const UNLIMITED: &[&str] = &["unlimited_interviews", "unlimited_questions"];

    struct TestApp {
        state: AppState,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let state = test_state::build();
            Self {
                router: build_router(state.clone()),
                state,
            }
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header("authorization", format!("Bearer {token}"));
            }
            let body = match body {
                Some(json) => {
                    builder = builder.header("content-type", "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };
            self.call(builder.body(body).unwrap()).await
        }

        async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        async fn webhook(&self, body: Vec<u8>) -> StatusCode {
            let timestamp = Utc::now().timestamp();
            let signature = self.state.webhooks.sign("msg_1", timestamp, &body);
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/webhooks/identity")
                .header("svix-id", "msg_1")
                .header("svix-timestamp", timestamp.to_string())
                .header("svix-signature", signature)
                .body(Body::from(body))
                .unwrap();
            self.call(request).await.0
        }

        async fn sign_up(&self, user_id: &str, permissions: &[&str]) -> String {
            let status = self
                .webhook(fixtures::user_event("user.created", user_id, "Ada", 1_700_000_000_000))
                .await;
            assert_eq!(status, StatusCode::OK);
            test_tokens::issue(user_id, permissions)
        }

        async fn create_job_posting(&self, token: &str) -> String {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/v1/job-postings",
                    Some(token),
                    Some(json!({
                        "name": "Backend role",
                        "title": "Rust Engineer",
                        "description": "Axum, sqlx and Redis",
                        "experience_level": "senior"
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            assert_eq!(body["failed"], false);
            body["data"]["id"].as_str().unwrap().to_string()
        }

        async fn create_interview(&self, token: &str, job_posting_id: &str) -> (StatusCode, Value) {
            self.send(
                Method::POST,
                &format!("/api/v1/job-postings/{job_posting_id}/interviews"),
                Some(token),
                None,
            )
            .await
        }
    }

    #[tokio::test]
    async fn test_ownership_and_read_your_writes() {
        let app = TestApp::new();
        let token_a = app.sign_up("user_a", UNLIMITED).await;
        let token_b = app.sign_up("user_b", UNLIMITED).await;

        let job_posting_id = app.create_job_posting(&token_a).await;
        let (status, body) = app.create_interview(&token_a, &job_posting_id).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let interview_id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["duration"], "00:00:00");

        let uri = format!("/api/v1/interviews/{interview_id}");
        let (status, body) = app.send(Method::GET, &uri, Some(&token_a), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["duration"], "00:00:00");

        // Someone else's interview and a missing one look the same.
        let (status, foreign) = app.send(Method::GET, &uri, Some(&token_b), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let missing_uri = format!("/api/v1/interviews/{}", uuid::Uuid::new_v4());
        let (status, missing) = app.send(Method::GET, &missing_uri, Some(&token_b), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(foreign, missing);
        assert_eq!(foreign["error"]["message"], PERMISSION_MESSAGE);

        let (status, body) = app
            .send(
                Method::PATCH,
                &uri,
                Some(&token_b),
                Some(json!({"duration": "00:09:59"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"failed": true, "message": PERMISSION_MESSAGE}));

        let (status, body) = app
            .send(
                Method::PATCH,
                &uri,
                Some(&token_a),
                Some(json!({"duration": "00:01:30"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let (_, body) = app.send(Method::GET, &uri, Some(&token_a), None).await;
        assert_eq!(body["duration"], "00:01:30");
    }

    #[tokio::test]
    async fn test_missing_identity_is_rejected_without_side_effects() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/job-postings",
                None,
                Some(json!({"name": "x", "description": "y", "experience_level": "junior"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"failed": true, "message": PERMISSION_MESSAGE}));

        let (status, _) = app
            .send(Method::GET, "/api/v1/job-postings", Some("forged.token.value"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_job_posting_rejected_generically() {
        let app = TestApp::new();
        let token = app.sign_up("user_a", UNLIMITED).await;
        for body in [
            json!({"name": "  ", "description": "y", "experience_level": "junior"}),
            json!({"name": "x", "description": "y", "experience_level": "principal"}),
        ] {
            let (status, response) = app
                .send(Method::POST, "/api/v1/job-postings", Some(&token), Some(body))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["message"], INVALID_DATA_MESSAGE);
        }
        let (_, listed) = app
            .send(Method::GET, "/api/v1/job-postings", Some(&token), None)
            .await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_free_tier_allows_one_connected_interview() {
        let app = TestApp::new();
        let token = app.sign_up("user_a", &["1_interview"]).await;
        let job_posting_id = app.create_job_posting(&token).await;

        let (status, body) = app.create_interview(&token, &job_posting_id).await;
        assert_eq!(status, StatusCode::OK);
        let interview_id = body["data"]["id"].as_str().unwrap().to_string();

        // Not yet connected, so it does not count.
        let (status, _) = app.create_interview(&token, &job_posting_id).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send(
                Method::PATCH,
                &format!("/api/v1/interviews/{interview_id}"),
                Some(&token),
                Some(json!({"voice_chat_id": "chat_1"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.create_interview(&token, &job_posting_id).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"failed": true, "message": PLAN_LIMIT_MESSAGE}));

        let (_, listed) = app
            .send(
                Method::GET,
                &format!("/api/v1/job-postings/{job_posting_id}/interviews"),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["id"], interview_id.as_str());
    }

    #[tokio::test]
    async fn test_interview_creation_is_rate_limited() {
        let app = TestApp::new();
        let token = app.sign_up("user_a", UNLIMITED).await;
        let job_posting_id = app.create_job_posting(&token).await;

        for _ in 0..12 {
            let (status, _) = app.create_interview(&token, &job_posting_id).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) = app.create_interview(&token, &job_posting_id).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["message"], RATE_LIMIT_MESSAGE);
    }

    #[tokio::test]
    async fn test_foreign_job_posting_spends_no_rate_budget() {
        let app = TestApp::new();
        let token_a = app.sign_up("user_a", UNLIMITED).await;
        let token_b = app.sign_up("user_b", UNLIMITED).await;
        let job_posting_a = app.create_job_posting(&token_a).await;
        let job_posting_b = app.create_job_posting(&token_b).await;

        for _ in 0..20 {
            let (status, _) = app.create_interview(&token_b, &job_posting_a).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
        let (status, _) = app.create_interview(&token_b, &job_posting_b).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_finalized_interview_is_immutable() {
        let app = TestApp::new();
        let token = app.sign_up("user_a", UNLIMITED).await;
        let job_posting_id = app.create_job_posting(&token).await;
        let (_, body) = app.create_interview(&token, &job_posting_id).await;
        let interview_id: uuid::Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

        crate::interviews::db::update_interview(
            &app.state,
            interview_id,
            &InterviewUpdate {
                voice_chat_id: Some("chat_1".to_string()),
                feedback: Some("## Overall: 8/10".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let uri = format!("/api/v1/interviews/{interview_id}");
        let (status, _) = app
            .send(Method::PATCH, &uri, Some(&token), Some(json!({"duration": "00:05:00"})))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = app
            .send(Method::POST, &format!("{uri}/feedback"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = app.send(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(body["feedback"], "## Overall: 8/10");
        assert_eq!(body["duration"], "00:00:00");
    }

    #[tokio::test]
    async fn test_webhook_sync_is_idempotent_and_ordered() {
        let app = TestApp::new();
        let token = test_tokens::issue("user_a", &[]);

        let (_, body) = app.send(Method::GET, "/api/v1/me", Some(&token), None).await;
        assert_eq!(body, json!({"status": "pending_sync"}));

        let created = fixtures::user_event("user.created", "user_a", "Ada", 1_700_000_000_000);
        assert_eq!(app.webhook(created.clone()).await, StatusCode::OK);
        assert_eq!(app.webhook(created).await, StatusCode::OK);
        let updated = fixtures::user_event("user.updated", "user_a", "Augusta", 1_700_000_100_000);
        assert_eq!(app.webhook(updated).await, StatusCode::OK);
        // A late delivery of an older update does not win.
        let stale = fixtures::user_event("user.updated", "user_a", "Stale", 1_700_000_050_000);
        assert_eq!(app.webhook(stale).await, StatusCode::OK);

        let (_, body) = app.send(Method::GET, "/api/v1/me", Some(&token), None).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["user"]["name"], "Augusta Lovelace");
        assert_eq!(body["user"]["email"], "user_a@example.com");
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature_and_missing_email() {
        let app = TestApp::new();
        let body = fixtures::user_event("user.created", "user_a", "Ada", 1_700_000_000_000);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/webhooks/identity")
            .header("svix-id", "msg_1")
            .header("svix-timestamp", Utc::now().timestamp().to_string())
            .header("svix-signature", "v1,AAAA")
            .body(Body::from(body))
            .unwrap();
        assert_eq!(app.call(request).await.0, StatusCode::BAD_REQUEST);

        let no_email = json!({
            "type": "user.created",
            "data": {"id": "user_a", "email_addresses": [], "created_at": 1, "updated_at": 1}
        });
        assert_eq!(
            app.webhook(no_email.to_string().into_bytes()).await,
            StatusCode::BAD_REQUEST
        );

        let token = test_tokens::issue("user_a", &[]);
        let (_, me) = app.send(Method::GET, "/api/v1/me", Some(&token), None).await;
        assert_eq!(me["status"], "pending_sync");
    }

    #[tokio::test]
    async fn test_user_deletion_cascades() {
        let app = TestApp::new();
        let token = app.sign_up("user_a", UNLIMITED).await;
        let job_posting_id = app.create_job_posting(&token).await;
        let (_, body) = app.create_interview(&token, &job_posting_id).await;
        let interview_id = body["data"]["id"].as_str().unwrap().to_string();

        // Warm the cache for everything that is about to disappear.
        let job_posting_uri = format!("/api/v1/job-postings/{job_posting_id}");
        let interview_uri = format!("/api/v1/interviews/{interview_id}");
        assert_eq!(app.send(Method::GET, &job_posting_uri, Some(&token), None).await.0, StatusCode::OK);
        assert_eq!(app.send(Method::GET, &interview_uri, Some(&token), None).await.0, StatusCode::OK);

        assert_eq!(app.webhook(fixtures::deleted_event("user_a")).await, StatusCode::OK);

        assert_eq!(
            app.send(Method::GET, &job_posting_uri, Some(&token), None).await.0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            app.send(Method::GET, &interview_uri, Some(&token), None).await.0,
            StatusCode::FORBIDDEN
        );
        let (_, listed) = app
            .send(Method::GET, "/api/v1/job-postings", Some(&token), None)
            .await;
        assert_eq!(listed, json!([]));
        let (_, me) = app.send(Method::GET, "/api/v1/me", Some(&token), None).await;
        assert_eq!(me["status"], "pending_sync");
    }

    #[tokio::test]
    async fn test_job_posting_update_and_delete() {
        let app = TestApp::new();
        let token = app.sign_up("user_a", UNLIMITED).await;
        let job_posting_id = app.create_job_posting(&token).await;
        let uri = format!("/api/v1/job-postings/{job_posting_id}");

        let (status, body) = app
            .send(
                Method::PUT,
                &uri,
                Some(&token),
                Some(json!({
                    "name": "Platform role",
                    "description": "Kubernetes",
                    "experience_level": "mid-level"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let (_, body) = app.send(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(body["name"], "Platform role");
        assert_eq!(body["experience_level"], "mid-level");
        assert_eq!(body["title"], Value::Null);

        let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_question_generation_checks_quota_before_upstream() {
        let app = TestApp::new();
        let token = app.sign_up("user_a", &[]).await;
        let owner_token = test_tokens::issue("user_a", UNLIMITED);
        let job_posting_id = app.create_job_posting(&owner_token).await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/v1/job-postings/{job_posting_id}/questions"),
                Some(&token),
                Some(json!({"difficulty": "easy"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], PLAN_LIMIT_MESSAGE);
    }

    #[tokio::test]
    async fn test_foreign_questions_look_missing() {
        let app = TestApp::new();
        let token_a = app.sign_up("user_a", UNLIMITED).await;
        let token_b = app.sign_up("user_b", UNLIMITED).await;
        let job_posting_id = app.create_job_posting(&token_a).await;
        let question = crate::questions::db::insert_question(
            &app.state,
            job_posting_id.parse().unwrap(),
            "How would you shard a Postgres table?",
            QuestionDifficulty::Hard,
        )
        .await
        .unwrap();

        let answer = json!({"answer": "By tenant id"});
        let (status, foreign) = app
            .send(
                Method::POST,
                &format!("/api/v1/questions/{}/feedback", question.id),
                Some(&token_b),
                Some(answer.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, missing) = app
            .send(
                Method::POST,
                &format!("/api/v1/questions/{}/feedback", uuid::Uuid::new_v4()),
                Some(&token_b),
                Some(answer),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(foreign, missing);
        assert_eq!(foreign["error"]["message"], PERMISSION_MESSAGE);

        let (status, foreign) = app
            .send(
                Method::GET,
                &format!("/api/v1/job-postings/{job_posting_id}/questions"),
                Some(&token_b),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, missing) = app
            .send(
                Method::GET,
                &format!("/api/v1/job-postings/{}/questions", uuid::Uuid::new_v4()),
                Some(&token_b),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(foreign, missing);

        let (status, listed) = app
            .send(
                Method::GET,
                &format!("/api/v1/job-postings/{job_posting_id}/questions"),
                Some(&token_a),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["id"], question.id.to_string());
    }

    #[tokio::test]
    async fn test_malformed_path_and_body_use_action_envelope() {
        let app = TestApp::new();
        let token = app.sign_up("user_a", &["unlimited_resume_analysis"]).await;
        let invalid = json!({"failed": true, "message": INVALID_DATA_MESSAGE});

        let (status, body) = app
            .send(
                Method::PATCH,
                "/api/v1/interviews/not-a-uuid",
                Some(&token),
                Some(json!({"duration": "00:01:00"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, invalid);

        let (status, body) = app
            .send(Method::DELETE, "/api/v1/job-postings/42", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, invalid);

        // Identity is still checked first.
        let (status, body) = app
            .send(Method::POST, "/api/v1/interviews/not-a-uuid/feedback", None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"failed": true, "message": PERMISSION_MESSAGE}));

        let job_posting_id = app.create_job_posting(&token).await;
        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/v1/job-postings/{job_posting_id}/resume-analysis"),
                Some(&token),
                Some(json!({"resume": "not a file"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, invalid);
    }
}
