//! Client for the voice-session provider (Hume EVI).
//!
//! Sessions run between the browser and the provider; this service only
//! mints access tokens and reads chat events back once a session is over.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

pub mod handlers;
pub mod transcript;

const API_BASE: &str = "https://api.hume.ai";
const PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Access token missing from response")]
    MissingToken,
}

impl From<VoiceError> for AppError {
    fn from(e: VoiceError) -> Self {
        AppError::Voice(e.to_string())
    }
}

/// One raw event of a chat, as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub message_text: Option<String>,
    /// JSON-encoded emotion scores, e.g. `{"Joy": 0.4, ...}`.
    #[serde(default)]
    pub emotion_features: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatEventsPage {
    #[serde(default)]
    events_page: Vec<ChatEvent>,
    page_number: u32,
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Clone)]
pub struct VoiceClient {
    client: Client,
    api_key: String,
    secret_key: String,
}

impl VoiceClient {
    pub fn new(api_key: String, secret_key: String) -> Result<Self, VoiceError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            api_key,
            secret_key,
        })
    }

    /// Every event of a chat in chronological order, across all pages.
    pub async fn fetch_chat_events(&self, chat_id: &str) -> Result<Vec<ChatEvent>, VoiceError> {
        let url = format!("{API_BASE}/v0/evi/chats/{chat_id}");
        let mut events = Vec::new();
        let mut page_number = 0u32;

        loop {
            let response = self
                .client
                .get(&url)
                .header("X-Hume-Api-Key", &self.api_key)
                .query(&[
                    ("page_number", page_number.to_string()),
                    ("page_size", PAGE_SIZE.to_string()),
                    ("ascending_order", "true".to_string()),
                ])
                .send()
                .await?;
            let page: ChatEventsPage = check(response).await?.json().await?;

            debug!(
                "Fetched chat {chat_id} page {}/{} ({} events)",
                page.page_number + 1,
                page.total_pages,
                page.events_page.len()
            );
            events.extend(page.events_page);

            page_number = page.page_number + 1;
            if page_number >= page.total_pages {
                break;
            }
        }

        Ok(events)
    }

    /// Short-lived token the browser uses to open a voice session.
    pub async fn access_token(&self) -> Result<String, VoiceError> {
        let response = self
            .client
            .post(format!("{API_BASE}/oauth2-cc/token"))
            .basic_auth(&self.api_key, Some(&self.secret_key))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let token: TokenResponse = check(response).await?.json().await?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(VoiceError::MissingToken)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, VoiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(VoiceError::Api {
        status: status.as_u16(),
        message,
    })
}
