use std::future::Future;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{ser::SerializeStruct, Serialize, Serializer};

use super::AuthUser;
use crate::errors::AppError;

/// Outcome of a mutating action. Serialized as
/// `{"failed": false, "data": …}` or `{"failed": true, "message": …}`.
#[derive(Debug)]
pub enum ActionResult<T> {
    Ok(T),
    Failed { status: StatusCode, message: String },
}

impl<T> ActionResult<T> {
    pub fn from_error(err: AppError) -> Self {
        let (status, _, message) = err.public_parts();
        ActionResult::Failed { status, message }
    }
}

impl<T: Serialize> Serialize for ActionResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ActionResult", 2)?;
        match self {
            ActionResult::Ok(data) => {
                s.serialize_field("failed", &false)?;
                s.serialize_field("data", data)?;
            }
            ActionResult::Failed { message, .. } => {
                s.serialize_field("failed", &true)?;
                s.serialize_field("message", message)?;
            }
        }
        s.end()
    }
}

impl<T: Serialize> IntoResponse for ActionResult<T> {
    fn into_response(self) -> Response {
        let status = match &self {
            ActionResult::Ok(_) => StatusCode::OK,
            ActionResult::Failed { status, .. } => *status,
        };
        (status, Json(self)).into_response()
    }
}

/// Runs `action` for an authenticated caller. Authentication failures and
/// every error the action returns come back as `ActionResult::Failed`.
pub async fn with_auth<T, F, Fut>(auth: Result<AuthUser, AppError>, action: F) -> ActionResult<T>
where
    F: FnOnce(AuthUser) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let user = match auth {
        Ok(user) => user,
        Err(e) => return ActionResult::from_error(e),
    };

    match action(user).await {
        Ok(value) => ActionResult::Ok(value),
        Err(e) => ActionResult::from_error(e),
    }
}
