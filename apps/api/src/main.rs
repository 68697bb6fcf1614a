mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::fetcher::TavilyFetcher;
use crate::analysis::model_selector::{ProviderKind, DEFAULT_MODEL};
use crate::analysis::orchestrator::{Orchestrator, Timeouts};
use crate::config::Config;
use crate::llm_client::anthropic::AnthropicProvider;
use crate::llm_client::gemini::GeminiProvider;
use crate::llm_client::groq::GroqProvider;
use crate::llm_client::ProviderRegistry;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SEO API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize content extraction
    let fetcher = Arc::new(TavilyFetcher::new(
        config.tavily_api_key.clone(),
        config.fetch_timeout,
    )?);
    info!("Tavily fetcher initialized (timeout: {:?})", config.fetch_timeout);

    // Initialize model providers
    let providers = build_providers(&config)?;
    info!(
        "LLM providers initialized: {:?} (default model: {})",
        providers.kinds(),
        DEFAULT_MODEL.model_name
    );

    let orchestrator = Orchestrator::new(
        fetcher,
        providers,
        Timeouts {
            fetch: config.fetch_timeout,
            model: config.llm_timeout,
        },
        config.max_content_chars,
    );

    // Build app state
    let shutdown = CancellationToken::new();
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        shutdown: shutdown.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(config.cors_layer()?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Waits for Ctrl+C, then cancels in-flight analyses so shutdown does not
/// wait out a full model timeout.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, cancelling in-flight analyses");
    shutdown.cancel();
}

/// Registers every provider that has an API key. Gemini is required.
fn build_providers(config: &Config) -> Result<ProviderRegistry> {
    let mut providers = ProviderRegistry::new().with(
        ProviderKind::Gemini,
        Arc::new(GeminiProvider::new(
            config.gemini_api_key.clone(),
            config.llm_timeout,
        )?),
    );

    match &config.groq_api_key {
        Some(key) => {
            providers = providers.with(
                ProviderKind::Groq,
                Arc::new(GroqProvider::new(key.clone(), config.llm_timeout)?),
            );
        }
        None => warn!("GROQ_API_KEY not set; Groq models are unavailable"),
    }

    match &config.anthropic_api_key {
        Some(key) => {
            providers = providers.with(
                ProviderKind::Anthropic,
                Arc::new(AnthropicProvider::new(key.clone(), config.llm_timeout)?),
            );
        }
        None => warn!("ANTHROPIC_API_KEY not set; Claude models are unavailable"),
    }

    Ok(providers)
}
