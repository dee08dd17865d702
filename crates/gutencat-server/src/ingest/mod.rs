// Catalog Ingestion Module
//
// Pulls the Project Gutenberg RDF catalog feed (rdf-files.tar.zip), expands it,
// masks every RDF record down to the fields we index and upserts them into
// PostgreSQL.
//
// Architecture (download -> parse -> store):
// - Fetch: streaming HTTP download + two-stage decompression (zip/gzip, then tar)
// - Discover: recursive walk of the expansion directory
// - Parse/Mask: RDF/XML document model + field extraction rules
// - Store: idempotent keyed upsert
// - Pipeline: one session per run, files processed strictly in sequence
//
// Data source:
// - https://gutenberg.org/cache/epub/feeds/rdf-files.tar.zip (~100MB, ~70k records)

pub mod common;
pub mod config;
pub mod discovery;
pub mod fetcher;
pub mod pipeline;
pub mod rdf;
pub mod session;
pub mod storage;

pub use config::IngestConfig;
pub use discovery::{FileDiscoverer, RecordFile};
pub use fetcher::ArchiveFetcher;
pub use pipeline::{CatalogPipeline, PipelineStats};
pub use rdf::{Masked, MaskedMetadata, PublicationDate, RawNode, RdfMetadataExtractor};
pub use session::Session;
pub use storage::{InMemoryMetadataStore, MetadataStore, PgMetadataStore};

/// Result type for catalog ingestion
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for catalog ingestion
///
/// Nothing in the pipeline retries; every variant travels unchanged up to the
/// caller of [`CatalogPipeline::run`].
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Network(err.to_string())
    }
}

impl From<zip::result::ZipError> for IngestError {
    fn from(err: zip::result::ZipError) -> Self {
        IngestError::Archive(err.to_string())
    }
}

impl From<tokio::task::JoinError> for IngestError {
    fn from(err: tokio::task::JoinError) -> Self {
        IngestError::Archive(format!("Decompression task failed: {}", err))
    }
}
