//! Identity-provider notifications, signed in the Svix scheme.

use anyhow::Context;
use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::models::user::UpsertUser;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

#[derive(Debug, Error, PartialEq)]
pub enum WebhookError {
    #[error("missing header {0}")]
    MissingHeader(&'static str),

    #[error("timestamp is not a unix time")]
    InvalidTimestamp,

    #[error("timestamp outside tolerance")]
    StaleTimestamp,

    #[error("no matching signature")]
    InvalidSignature,

    #[error("malformed payload: {0}")]
    Payload(String),

    #[error("user {0} has no primary email address")]
    MissingPrimaryEmail(String),
}

pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = STANDARD
            .decode(encoded)
            .context("Webhook signing secret is not valid base64")?;
        Ok(Self { key })
    }

    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
        self.verify_at(headers, body, Utc::now().timestamp())
    }

    fn verify_at(&self, headers: &HeaderMap, body: &[u8], now: i64) -> Result<(), WebhookError> {
        let id = header(headers, "svix-id")?;
        let timestamp = header(headers, "svix-timestamp")?;
        let signatures = header(headers, "svix-signature")?;

        let sent_at: i64 = timestamp
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        if (now - sent_at).abs() > TIMESTAMP_TOLERANCE_SECS {
            return Err(WebhookError::StaleTimestamp);
        }

        let mac = self.mac(id, timestamp, body)?;
        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|encoded| STANDARD.decode(encoded).ok())
            .any(|candidate| mac.clone().verify_slice(&candidate).is_ok());

        if matched {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }

    /// `v1,<signature>` for a payload, as the provider would send it.
    #[cfg(test)]
    pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> String {
        let mac = self.mac(id, &timestamp.to_string(), body).unwrap();
        format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes()))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(WebhookError::MissingHeader(name))
}

#[derive(Debug, PartialEq)]
pub enum IdentityEvent {
    Upsert(UpsertUser),
    Delete(String),
    Ignored(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    created_at: i64,
    updated_at: i64,
}

#[derive(Deserialize)]
struct EmailAddress {
    id: String,
    email_address: String,
}

#[derive(Deserialize)]
struct DeletedUser {
    id: Option<String>,
}

/// Parses a verified payload. `user.created` and `user.updated` both become
/// upserts.
pub fn parse_event(body: &[u8]) -> Result<IdentityEvent, WebhookError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| WebhookError::Payload(e.to_string()))?;

    match envelope.event_type.as_str() {
        "user.created" | "user.updated" => {
            let user: ProviderUser = serde_json::from_value(envelope.data)
                .map_err(|e| WebhookError::Payload(e.to_string()))?;
            Ok(IdentityEvent::Upsert(user.into_record()?))
        }
        "user.deleted" => {
            let deleted: DeletedUser = serde_json::from_value(envelope.data)
                .map_err(|e| WebhookError::Payload(e.to_string()))?;
            deleted
                .id
                .filter(|id| !id.is_empty())
                .map(IdentityEvent::Delete)
                .ok_or_else(|| WebhookError::Payload("deleted user has no id".to_string()))
        }
        _ => Ok(IdentityEvent::Ignored(envelope.event_type)),
    }
}

impl ProviderUser {
    fn into_record(self) -> Result<UpsertUser, WebhookError> {
        let email = self
            .primary_email_address_id
            .as_deref()
            .and_then(|primary| self.email_addresses.iter().find(|e| e.id == primary))
            .map(|e| e.email_address.clone())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| WebhookError::MissingPrimaryEmail(self.id.clone()))?;

        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(UpsertUser {
            name,
            email,
            image_url: self.image_url.unwrap_or_default(),
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
            id: self.id,
        })
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, WebhookError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| WebhookError::Payload(format!("invalid timestamp {ms}")))
}

#[cfg(test)]
pub mod fixtures {
    use serde_json::json;

    pub fn user_event(kind: &str, id: &str, first_name: &str, updated_at: i64) -> Vec<u8> {
        json!({
            "type": kind,
            "object": "event",
            "data": {
                "id": id,
                "first_name": first_name,
                "last_name": "Lovelace",
                "image_url": "https://img.example.com/a.png",
                "primary_email_address_id": "idn_2",
                "email_addresses": [
                    {"id": "idn_1", "email_address": format!("old-{id}@example.com")},
                    {"id": "idn_2", "email_address": format!("{id}@example.com")}
                ],
                "created_at": 1_700_000_000_000i64,
                "updated_at": updated_at
            }
        })
        .to_string()
        .into_bytes()
    }

    pub fn deleted_event(id: &str) -> Vec<u8> {
        json!({"type": "user.deleted", "data": {"id": id, "deleted": true}})
            .to_string()
            .into_bytes()
    }
}
