use std::sync::Arc;

use crate::auth::SessionVerifier;
use crate::cache::Cache;
use crate::llm_client::LlmClient;
use crate::rate_limit::RateLimiter;
use crate::store::Store;
use crate::users::sync::UserSync;
use crate::users::webhook::WebhookVerifier;
use crate::voice::VoiceClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Read-through cache in front of `store`; Redis when configured.
    pub cache: Arc<dyn Cache>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub llm: LlmClient,
    pub voice: VoiceClient,
    pub sessions: Arc<SessionVerifier>,
    pub webhooks: Arc<WebhookVerifier>,
    pub user_sync: UserSync,
}

#[cfg(test)]
pub mod test_state {
    use super::*;
    use crate::auth::session::test_tokens;
    use crate::cache::memory::MemoryCache;
    use crate::rate_limit::memory::MemoryRateLimiter;
    use crate::store::memory::MemoryStore;

    /// `whsec_` secret whose key is `test-webhook-key`.
    pub const WEBHOOK_SECRET: &str = "whsec_dGVzdC13ZWJob29rLWtleQ==";

    /// In-memory backends and HS256 session tokens. Upstream clients point
    /// at the real providers with dummy keys and are never reached.
    pub fn build() -> AppState {
        AppState {
            store: Arc::new(MemoryStore::new()),
            cache: Arc::new(MemoryCache::new()),
            rate_limiter: Arc::new(MemoryRateLimiter::new()),
            llm: LlmClient::new("test-key".to_string()).unwrap(),
            voice: VoiceClient::new("test-key".to_string(), "test-secret".to_string()).unwrap(),
            sessions: Arc::new(SessionVerifier::from_secret(test_tokens::SECRET)),
            webhooks: Arc::new(WebhookVerifier::new(WEBHOOK_SECRET).unwrap()),
            user_sync: UserSync::new(),
        }
    }
}
