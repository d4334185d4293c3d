use anyhow::Context;
use content_repurposer::{
    api::{build_router, AppState},
    config::Config,
    inference::{GroqProvider, InferenceRouter},
    logging::init_tracing,
    profile::{InMemoryProfileStore, ProfileService},
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("REPURPOSER_CONFIG").ok();
    let config = Config::load(config_path.as_deref().or(Some("config")))
        .context("Failed to load configuration")?;

    init_tracing(&config.logging);

    if config.upstream.api_key.is_none() {
        warn!("GROQ_API_KEY is not set; upstream calls will be rejected");
    }

    let models = config.upstream.models.clone();
    let provider = GroqProvider::new(config.upstream.clone())
        .context("Failed to build upstream client")?;
    let router = Arc::new(InferenceRouter::new(Arc::new(provider), models));
    let profiles = Arc::new(ProfileService::new(Arc::new(InMemoryProfileStore::new())));

    let app = build_router(AppState {
        router,
        profiles,
        max_body_bytes: config.server.max_body_bytes,
    });

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Server listening on {}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
