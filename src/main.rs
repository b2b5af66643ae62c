//! Manifest Server - IIIF Presentation and Activity Stream documents over Solr.

mod config;
mod hierarchy;
mod identifiers;
mod iiif;
mod metadata;
mod render;
mod routes;
mod solr;

use std::sync::Arc;

use anyhow::Context;
use config::ServerConfig;
use routes::AppState;
use solr::client::SolrClient;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Config decides the default log filter, so it loads before tracing is up.
    let config = ServerConfig::from_env()?;

    let default_filter = if config.common.debug {
        "manifest_server=debug,tower_http=debug"
    } else {
        "manifest_server=warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Loaded config from {}", ServerConfig::path());

    let backend = SolrClient::new(&config.solr.server, &config.solr.handler);
    info!("Solr backend at {}/{}", config.solr.server, config.solr.handler);

    let bind = config.common.bind.clone();
    let app = routes::router(AppState {
        backend: Arc::new(backend),
        config: Arc::new(config),
    });

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Server listening on http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}
