mod error;
mod routes;
mod state;

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use dora_metrics_core::{
    ConfigLoader,
    MetricsContext,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    dora_metrics_core::logging::init();

    tracing::info!("Starting DORA metrics server");

    let config = ConfigLoader::resolve().context("Failed to load config")?;
    let bind_addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.server.bind_addr))?;

    tracing::info!(
        invocation_timeout_secs = config.server.invocation_timeout_secs,
        query_timeout_secs = config.history.timeout_secs,
        "Configuration loaded"
    );

    let context = MetricsContext::from_config(config).context("Failed to initialize clients")?;

    let app = Router::new()
        .nest("/api/v1", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(context));

    tracing::info!("Listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
