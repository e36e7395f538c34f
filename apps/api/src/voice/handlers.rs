use axum::extract::State;
use serde::Serialize;

use crate::auth::{with_auth, ActionResult, AuthUser};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct VoiceToken {
    pub access_token: String,
}

/// POST /api/v1/voice/token
pub async fn handle_voice_token(
    State(state): State<AppState>,
    auth: Result<AuthUser, AppError>,
) -> ActionResult<VoiceToken> {
    with_auth(auth, |_| async move {
        let access_token = state.voice.access_token().await?;
        Ok(VoiceToken { access_token })
    })
    .await
}
