//! Gutenberg catalog ingestion server
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Pulls the Project Gutenberg RDF catalog feed, masks every record down to
//! the indexed field subset and upserts the result into PostgreSQL.
//!
//! - **Ingest**: fetch, expand, discover, parse, mask and store ([`ingest`])
//! - **API**: HTTP trigger for a sync run and read access to stored records
//! - **Configuration**: environment-based, see [`config::Config::load`]
//!
//! # Example
//!
//! ```no_run
//! use gutencat_server::config::Config;
//! use gutencat_server::ingest::{CatalogPipeline, PgMetadataStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = PgMetadataStore::connect(&config.database).await?;
//!     let pipeline = CatalogPipeline::new(config.ingest.clone(), Arc::new(store))?;
//!     let stats = pipeline.run(&config.ingest.feed_url).await?;
//!     println!("processed {} files", stats.n);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod middleware;

pub use error::AppError;
