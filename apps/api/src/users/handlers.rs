use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::sync::{self, SyncStatus, MAX_WAIT};
use super::webhook::{parse_event, IdentityEvent};
use super::db;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/webhooks/identity
pub async fn handle_identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let event = state
        .webhooks
        .verify(&headers, &body)
        .and_then(|_| parse_event(&body))
        .map_err(|e| {
            warn!("Rejected identity webhook: {e}");
            AppError::invalid_data()
        })?;

    match event {
        IdentityEvent::Upsert(user) => {
            db::upsert_user(&state, &user).await?;
            state.user_sync.notify(&user.id);
            info!("Synced user {}", user.id);
        }
        IdentityEvent::Delete(id) => {
            let cascade = db::delete_user(&state, &id).await?;
            info!(
                "Deleted user {id} ({} job postings, {} interviews, {} questions)",
                cascade.job_posting_ids.len(),
                cascade.interview_ids.len(),
                cascade.question_ids.len()
            );
        }
        IdentityEvent::Ignored(kind) => debug!("Ignoring identity event {kind}"),
    }

    Ok(Json(json!({ "received": true })))
}

#[derive(Deserialize)]
pub struct MeQuery {
    #[serde(default)]
    pub wait: bool,
}

/// GET /api/v1/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<MeQuery>,
) -> Result<Json<SyncStatus>, AppError> {
    let status = if params.wait {
        sync::wait_until_ready(&state, &user.user_id, MAX_WAIT).await?
    } else {
        sync::status(&state, &user.user_id).await?
    };
    Ok(Json(status))
}
