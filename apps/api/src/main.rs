mod actions;
mod config;
mod creations;
mod db;
mod documents;
mod errors;
mod gate;
mod identity;
mod llm_client;
mod media;
mod models;
mod routes;
mod state;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::creations::PgCreationStore;
use crate::db::{create_pool, run_migrations};
use crate::documents::PdfTextExtractor;
use crate::identity::ClerkIdentity;
use crate::llm_client::LlmClient;
use crate::media::{ClipdropClient, CloudinaryClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Studio API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize providers
    let llm = LlmClient::new(
        config.llm_api_key.clone(),
        &config.llm_base_url,
        config.llm_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    let image_generator = ClipdropClient::new(config.clipdrop_api_key.clone())?;
    let image_host = CloudinaryClient::new(
        config.cloudinary_cloud_name.clone(),
        config.cloudinary_api_key.clone(),
        config.cloudinary_api_secret.clone(),
        config.cloudinary_signature_algorithm,
    )?;
    info!(
        "Image providers initialized (cloud: {}, signatures: {})",
        config.cloudinary_cloud_name,
        config.cloudinary_signature_algorithm.as_str()
    );

    let identity = ClerkIdentity::new(&config.clerk_api_url, config.clerk_secret_key.clone())?;
    info!("Identity provider initialized ({})", config.clerk_api_url);

    // Build app state
    let state = AppState {
        identity: Arc::new(identity),
        llm: Arc::new(llm),
        image_generator: Arc::new(image_generator),
        image_host: Arc::new(image_host),
        documents: Arc::new(PdfTextExtractor),
        creations: Arc::new(PgCreationStore::new(db)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
