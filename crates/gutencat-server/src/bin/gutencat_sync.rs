//! gutencat-sync - one-shot catalog ingestion without the HTTP server

use anyhow::{Context, Result};
use clap::Parser;
use gutencat_common::logging::{init_logging, LogConfig, LogLevel};
use gutencat_server::config::DatabaseConfig;
use gutencat_server::ingest::{
    CatalogPipeline, InMemoryMetadataStore, IngestConfig, MetadataStore, PgMetadataStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gutencat-sync")]
#[command(author, version, about = "Ingest the Project Gutenberg RDF catalog")]
struct Cli {
    /// Catalog feed URL (defaults to CATALOG_FEED_URL or the public feed)
    #[arg(long)]
    feed_url: Option<String>,

    /// Root for session archives and expansion directories
    #[arg(long, env = "CATALOG_TMP_DIR")]
    tmp_dir: Option<PathBuf>,

    /// Parse and mask everything but keep records in memory only
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("gutencat-sync")
        .build();

    // Environment variables take precedence
    init_logging(&LogConfig::from_env_or(log_config)?)?;

    let mut config = IngestConfig::from_env();
    if let Some(feed_url) = cli.feed_url {
        config.feed_url = feed_url;
    }
    if let Some(tmp_dir) = cli.tmp_dir {
        config.tmp_root = tmp_dir;
    }

    let store: Arc<dyn MetadataStore> = if cli.dry_run {
        info!("Dry run: records are kept in memory");
        Arc::new(InMemoryMetadataStore::new())
    } else {
        let database = DatabaseConfig::from_env();
        database.validate()?;
        Arc::new(
            PgMetadataStore::connect(&database)
                .await
                .context("Failed to open catalog store")?,
        )
    };

    let feed_url = config.feed_url.clone();
    let pipeline = CatalogPipeline::new(config, store.clone())?;
    let stats = pipeline.run(&feed_url).await?;

    info!(
        "Catalog sync complete: {} files processed, {} records in store",
        stats.n,
        store.count().await?
    );
    println!("{}", serde_json::to_string(&stats)?);

    Ok(())
}
