//! Two-phase identity sync: a signed-in user is `pending_sync` until the
//! identity provider's webhook has created the local record, then `ready`.
//! The state is read from whether the local record exists, so a user the
//! provider deletes reads as `pending_sync` again.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

use super::db;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub const MAX_WAIT: Duration = Duration::from_secs(25);

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    PendingSync,
    Ready { user: User },
}

/// Publishes the ids of users whose records were just written.
#[derive(Clone)]
pub struct UserSync {
    tx: broadcast::Sender<String>,
}

impl UserSync {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn notify(&self, user_id: &str) {
        // No subscribers is the common case.
        let _ = self.tx.send(user_id.to_string());
    }
}

impl Default for UserSync {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn status(state: &AppState, user_id: &str) -> Result<SyncStatus, AppError> {
    Ok(match db::get_user(state, user_id).await? {
        Some(user) => SyncStatus::Ready { user },
        None => SyncStatus::PendingSync,
    })
}

/// Returns as soon as the user is ready, or `PendingSync` after `timeout`.
pub async fn wait_until_ready(
    state: &AppState,
    user_id: &str,
    timeout: Duration,
) -> Result<SyncStatus, AppError> {
    // Subscribe before checking so an upsert between the two is not missed.
    let mut rx = state.user_sync.subscribe();
    if let ready @ SyncStatus::Ready { .. } = status(state, user_id).await? {
        return Ok(ready);
    }

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            received = rx.recv() => match received {
                Ok(id) if id == user_id => break,
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => {
                    if let ready @ SyncStatus::Ready { .. } = status(state, user_id).await? {
                        return Ok(ready);
                    }
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    status(state, user_id).await
}
