//! wealth-pulse HTTP Server
//!
//! Axum host for headless dashboard sessions. Clients post touch and button
//! inputs and render the returned `DashboardView`.

mod handlers;
mod session;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use advisor_core::LlmProvider;
use advisor_runtime::{GeminiProvider, OllamaProvider};
use portfolio_dashboard::{DashboardDriver, DriverConfig, MockPortfolioSource, PortfolioSource};

use crate::state::AppState;

/// Pick the advice backend from `ADVISOR_PROVIDER`
fn select_provider() -> anyhow::Result<Arc<dyn LlmProvider>> {
    let choice = std::env::var("ADVISOR_PROVIDER").unwrap_or_else(|_| "gemini".into());
    match choice.to_lowercase().as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::from_env()?)),
        "ollama" => Ok(Arc::new(OllamaProvider::from_env())),
        other => anyhow::bail!("unknown ADVISOR_PROVIDER '{other}' (expected gemini or ollama)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let provider = select_provider()?;

    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to {}", provider.name());
            if let Ok(models) = provider.list_models().await {
                for model in models {
                    tracing::info!("  Model: {}", model.id);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {} not available - advice will show the fallback", provider.name());
        }
    }

    let source: Arc<dyn PortfolioSource> = Arc::new(MockPortfolioSource::from_env());
    let config = DriverConfig::from_env();
    tracing::info!(
        source = source.name(),
        model = %config.model,
        advice_timeout = ?config.advice_timeout,
        refresh_timeout = ?config.refresh_timeout,
        "dashboard driver configured"
    );

    let state = AppState::new(DashboardDriver::new(provider, source, config));

    let session_idle = state::session_idle_from_env();
    state.spawn_reaper(session_idle);
    tracing::info!(idle = ?session_idle, "idle session reaper started");
    let app = handlers::router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 wealth-pulse server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                  - Health check");
    tracing::info!("  POST   /api/sessions            - Open a dashboard");
    tracing::info!("  GET    /api/sessions/{{id}}       - Current view");
    tracing::info!("  POST   /api/sessions/{{id}}/events - Send an input");
    tracing::info!("  DELETE /api/sessions/{{id}}       - Close a dashboard");

    axum::serve(listener, app).await?;

    Ok(())
}
