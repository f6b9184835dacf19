//! Storyhall API server entry point.

use std::error::Error;
use std::sync::{Arc, Mutex};

use storyhall_api::config::Config;
use storyhall_api::qr::SvgQrRenderer;
use storyhall_api::routes;
use storyhall_api::state::AppState;
use storyhall_core::clock::{Clock, SystemClock};
use storyhall_core::rng::{DeterministicRng, SystemRng};
use storyhall_narration::guarded::GuardedNarrator;
use storyhall_narration::narrator::Narrator;
use storyhall_narration::openai::OpenAiNarrator;
use storyhall_narration::rule_based::RuleBasedNarrator;
use storyhall_session::application::router::ConnectionRouter;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Storyhall API server");

    let config = Config::from_env()?;

    // Pick the narration backend.
    let primary: Arc<dyn Narrator> = match &config.openai {
        Some(openai) => {
            tracing::info!(model = %openai.model, "using OpenAI-compatible narration");
            Arc::new(OpenAiNarrator::new(
                &openai.base_url,
                &openai.api_key,
                &openai.model,
                config.narration.timeout,
            ))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, using rule-based narration");
            Arc::new(RuleBasedNarrator)
        }
    };
    let narrator = GuardedNarrator::new(primary, config.narration);

    // Build application state.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> =
        Arc::new(Mutex::new(SystemRng::from_entropy()));
    let router = Arc::new(ConnectionRouter::new(clock, rng, narrator));
    let app_state = AppState::new(
        router,
        Arc::new(SvgQrRenderer::default()),
        config.public_base_url.clone(),
        config.local_base_url(),
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
