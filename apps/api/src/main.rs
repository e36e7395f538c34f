mod access;
mod auth;
mod cache;
mod config;
mod db;
mod errors;
mod interviews;
mod job_postings;
mod llm_client;
mod models;
mod questions;
mod quota;
mod rate_limit;
mod resumes;
mod routes;
mod state;
mod store;
mod users;
mod voice;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::SessionVerifier;
use crate::cache::{memory::MemoryCache, redis_cache::RedisCache, Cache};
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::rate_limit::{memory::MemoryRateLimiter, redis_limiter::RedisRateLimiter, RateLimiter};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgStore;
use crate::users::sync::UserSync;
use crate::users::webhook::WebhookVerifier;
use crate::voice::VoiceClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (aborts on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobPrep API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(db));

    // Initialize cache and rate limiter: shared through Redis when configured
    let (cache, rate_limiter) = build_shared_backends(&config).await?;

    // Initialize upstream clients
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let voice = VoiceClient::new(config.hume_api_key.clone(), config.hume_secret_key.clone())?;
    info!("Voice client initialized");

    // Initialize identity verification
    let sessions = Arc::new(
        SessionVerifier::from_rsa_pem(&config.clerk_jwt_key)
            .context("CLERK_JWT_KEY is not a valid RSA public key")?,
    );
    let webhooks = Arc::new(WebhookVerifier::new(&config.clerk_webhook_signing_secret)?);

    // Build app state
    let state = AppState {
        store,
        cache,
        rate_limiter,
        llm,
        voice,
        sessions,
        webhooks,
        user_sync: UserSync::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web front end

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_shared_backends(
    config: &Config,
) -> Result<(Arc<dyn Cache>, Arc<dyn RateLimiter>)> {
    match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            let cache = RedisCache::connect(&client)
                .await
                .context("Could not connect to Redis")?;
            let limiter = RedisRateLimiter::connect(&client).await?;
            info!("Redis cache and rate limiter initialized");
            Ok((Arc::new(cache), Arc::new(limiter)))
        }
        None => {
            warn!("REDIS_URL not set; cache and rate limits are local to this process");
            Ok((
                Arc::new(MemoryCache::new()),
                Arc::new(MemoryRateLimiter::new()),
            ))
        }
    }
}
