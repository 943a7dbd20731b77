mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod profile;
mod registry;
mod research;
mod routes;
mod search_client;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::generation::orchestrator::AnswerGenerator;
use crate::llm_client::GeminiClient;
use crate::profile::PgProfileStore;
use crate::registry::RegistryClient;
use crate::research::cache::PgResearchCache;
use crate::research::resolver::CompanyResearcher;
use crate::routes::build_router;
use crate::search_client::TavilyClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let crate_name = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!("{crate_name}={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ES generation API v{}", env!("CARGO_PKG_VERSION"));

    // Absent credentials are allowed at boot; the operations that need
    // them fail with a configuration error instead.
    for (key, value) in [
        ("GEMINI_API_KEY", &config.gemini_api_key),
        ("TAVILY_API_KEY", &config.tavily_api_key),
        ("GBIZ_API_KEY", &config.gbiz_api_key),
    ] {
        if value.is_none() {
            warn!("{key} is not set; dependent operations will fail until it is configured");
        }
    }

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize external API clients
    let llm = Arc::new(GeminiClient::new(config.gemini_api_key.clone()));
    let registry = RegistryClient::new(config.gbiz_api_key.clone());
    info!("External API clients initialized");

    // Wire stores, the research resolver and the answer generator
    let profiles = Arc::new(PgProfileStore::new(db.clone()));
    let researcher = Arc::new(CompanyResearcher::new(
        Arc::new(PgResearchCache::new(db.clone())),
        Arc::new(TavilyClient::new()),
        config.tavily_api_key.clone(),
    ));
    let generator = Arc::new(AnswerGenerator::new(llm, researcher, profiles.clone()));

    // Build app state
    let state = AppState {
        profiles,
        generator,
        registry,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
