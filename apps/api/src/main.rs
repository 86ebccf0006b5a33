mod blobs;
mod comparison;
mod config;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod resumes;
mod routes;
mod session;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::blobs::{BlobStore, MemoryBlobStore, S3BlobStore};
use crate::config::{Config, StorageBackend};
use crate::llm_client::scorer::LlmFeedbackScorer;
use crate::llm_client::LlmClient;
use crate::pipeline::policy::Action;
use crate::routes::build_router;
use crate::session::SessionRegistry;
use crate::state::AppState;
use crate::store::{MemoryStore, RecordStore, RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting VibeHire API v{}", env!("CARGO_PKG_VERSION"));
    for action in Action::ALL {
        debug!("Policy: {action} granted to {:?}", config.policy.roles_for(action));
    }

    let (store, blobs): (Arc<dyn RecordStore>, Arc<dyn BlobStore>) = match &config.storage {
        StorageBackend::External { redis_url, s3 } => {
            let store = RedisStore::connect(redis_url).await?;
            let blobs = S3BlobStore::connect(s3).await;
            (Arc::new(store), Arc::new(blobs))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory stores; data will not survive a restart");
            (Arc::new(MemoryStore::new()), Arc::new(MemoryBlobStore::new()))
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let sessions = SessionRegistry::new();
    spawn_session_sweeper(sessions.clone());

    let state = AppState {
        store,
        blobs,
        scorer: Arc::new(LlmFeedbackScorer::new(llm)),
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drops idle sessions so the registry stays bounded.
fn spawn_session_sweeper(sessions: SessionRegistry) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sessions.idle_timeout() / 8);
        loop {
            ticker.tick().await;
            let dropped = sessions.sweep_idle().await;
            if dropped > 0 {
                info!("Dropped {dropped} idle session(s)");
            }
        }
    });
}
