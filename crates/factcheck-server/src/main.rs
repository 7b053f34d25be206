mod auth;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use pipeline::{
    check_endpoint, ClientSet, DeliberationEngine, HttpExtractor, HttpSearchClient,
    JobOrchestrator, MemoryJobStore, OpenAiReasoner, OwnerOnly, PipelineConfig, StatusPublisher,
};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "factcheck-server", about = "Fact-check analysis service")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8300")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = PipelineConfig::default();
    info!(
        reasoner = %config.reasoner.url,
        model = %config.reasoner.model,
        extractor = %config.extraction_url,
        "fact-check server starting"
    );

    if !check_endpoint(&config.reasoner.url).await {
        warn!("reasoning endpoint not reachable — jobs will fail until it comes up");
    }

    let clients = ClientSet::from_config(&config)?;
    let store = MemoryJobStore::shared();

    let engine = DeliberationEngine::new(
        Arc::new(OpenAiReasoner::new(
            clients.reasoner,
            config.reasoner.model.clone(),
        )),
        Arc::new(HttpSearchClient::new(&config.search_url)),
        config.max_rounds,
    );
    let orchestrator = Arc::new(JobOrchestrator::new(
        Arc::clone(&store),
        Arc::new(HttpExtractor::new(&config.extraction_url)),
        engine,
    ));
    let publisher = Arc::new(StatusPublisher::new(
        Arc::clone(&store),
        Arc::new(OwnerOnly),
        config.publish_interval,
    ));

    let app = routes::router(AppState {
        orchestrator,
        publisher,
        identity: Arc::new(auth::StaticTokens::from_env()),
    })
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!(bind = %args.bind, "listening");
    axum::serve(listener, app).await.context("server exited")?;

    Ok(())
}
