use std::sync::Arc;

use anyhow::Context;

pub mod cache;
pub mod config;
pub mod error;
pub mod mode;
pub mod provider;
pub mod relay;
pub mod routes;
pub mod scripts;
mod templates;
pub mod util;

use config::RelayConfig;
use provider::OpenRouterClient;
use relay::RelayService;

/// Load configuration, bind the HTTP listener and serve until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    let config = Arc::new(RelayConfig::load()?);
    if config.api_key.is_none() {
        // Not fatal: /health and / keep working, generation answers with a configuration error.
        tracing::warn!("OPENROUTER_API_KEY is not set; generation requests will fail");
    }

    let provider = OpenRouterClient::new(&config).context("building provider HTTP client")?;
    let relay = Arc::new(RelayService::new(config.clone(), Arc::new(provider)));
    let app = routes::router(relay);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(
        "relay listening on http://{addr} (default mode {}, model {})",
        config.effective_default_mode().as_str(),
        config.default_model
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down");
}
