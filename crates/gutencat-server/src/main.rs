//! Gutenberg catalog server - main entry point

use anyhow::Result;
use gutencat_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

use gutencat_server::{
    api::{self, AppState},
    config::Config,
    ingest::{CatalogPipeline, PgMetadataStore},
    middleware,
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("gutencat-server")
        .filter_directives("gutencat_server=debug,tower_http=debug,sqlx=warn")
        .build();

    // Environment variables take precedence
    init_logging(&LogConfig::from_env_or(log_config)?)?;

    info!("Starting gutencat server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let store = PgMetadataStore::connect(&config.database).await?;
    info!("Catalog table '{}' ready", store.table());

    let pipeline = CatalogPipeline::new(config.ingest.clone(), Arc::new(store))?;
    info!(
        "Ingestion pipeline ready (feed: {}, temp root: {})",
        config.ingest.feed_url,
        config.ingest.tmp_root.display()
    );

    let app = api::create_router(AppState::new(pipeline))
        .layer(CompressionLayer::new())
        .layer(middleware::cors_layer(&config.cors));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => info!("Received terminate signal, starting graceful shutdown"),
    }

    // A sync run in flight is not cancelled; it keeps its connection until done
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
