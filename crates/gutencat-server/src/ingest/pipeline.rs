// Catalog Pipeline Orchestration
//
// One run = one session:
// 1. Download and expand the feed into the session's temp paths
// 2. Discover record files in the expansion directory
// 3. For each file, strictly in sequence: parse -> mask -> upsert
//
// The first error aborts the run. Records upserted before it stay in the
// store; the caller only sees the error.

use crate::ingest::discovery::{FileDiscoverer, RecordFile};
use crate::ingest::fetcher::ArchiveFetcher;
use crate::ingest::rdf::{Masked, RdfMetadataExtractor};
use crate::ingest::session::Session;
use crate::ingest::storage::MetadataStore;
use crate::ingest::{IngestConfig, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Log a progress line every this many files
const PROGRESS_INTERVAL: usize = 1000;

/// Result of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub ok: bool,
    /// Number of discovered record files
    pub n: usize,
}

/// Gutenberg catalog ingestion pipeline
pub struct CatalogPipeline {
    config: IngestConfig,
    fetcher: ArchiveFetcher,
    discoverer: FileDiscoverer,
    store: Arc<dyn MetadataStore>,
}

impl CatalogPipeline {
    /// Create a pipeline with a fetcher built from `config`
    pub fn new(config: IngestConfig, store: Arc<dyn MetadataStore>) -> Result<Self> {
        let fetcher = ArchiveFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, fetcher, store))
    }

    pub fn with_fetcher(
        config: IngestConfig,
        fetcher: ArchiveFetcher,
        store: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            config,
            fetcher,
            discoverer: FileDiscoverer::new(),
            store,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    /// Run one full ingestion of `feed_url`
    pub async fn run(&self, feed_url: &str) -> Result<PipelineStats> {
        let session = Session::new(&self.config.tmp_root);
        info!(session = %session.id, "Starting catalog ingestion from {}", feed_url);

        match self.run_session(&session, feed_url).await {
            Ok(stats) => Ok(stats),
            Err(e) => {
                error!(session = %session.id, "Catalog ingestion failed: {}", e);
                Err(e)
            },
        }
    }

    async fn run_session(&self, session: &Session, feed_url: &str) -> Result<PipelineStats> {
        let start = Instant::now();
        tokio::fs::create_dir_all(&self.config.tmp_root).await?;

        info!("Step 1/3: Fetching and expanding catalog feed...");
        let expansion_dir = self
            .fetcher
            .fetch_and_expand(feed_url, &session.archive_path, &session.expansion_dir)
            .await?;

        info!("Step 2/3: Discovering record files...");
        let files = self.discoverer.discover(&expansion_dir);

        info!("Step 3/3: Parsing and storing records...");
        let mut n = 0usize;
        for file in files {
            let file = file?;
            self.process_file(&file).await?;

            n += 1;
            if n % PROGRESS_INTERVAL == 0 {
                info!("Processed {} record files", n);
            }
        }

        info!(
            session = %session.id,
            "Catalog ingestion completed: {} files in {:.1}s",
            n,
            start.elapsed().as_secs_f64()
        );

        Ok(PipelineStats { ok: true, n })
    }

    /// Parse, mask and store a single record file
    async fn process_file(&self, file: &RecordFile) -> Result<()> {
        let path = &file.path;
        let mut extractor = RdfMetadataExtractor::new();
        extractor.parse(path).await?;

        match extractor.mask() {
            Masked::Ready(record) => {
                let named = file.catalog_id.and_then(|id| i64::try_from(id).ok());
                if named.is_some() && record.id.is_some() && named != record.id {
                    warn!(
                        file_id = ?file.catalog_id,
                        id = ?record.id,
                        "File name of {} disagrees with its ebook id",
                        path.display()
                    );
                }
                debug!(file_id = ?file.catalog_id, id = ?record.id, "Storing {}", path.display());
                self.store.upsert(record).await
            },
            Masked::NotReady => {
                warn!("Skipping {}: no document", path.display());
                Ok(())
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ingest::{InMemoryMetadataStore, IngestError};
    use tempfile::TempDir;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = IngestConfig::builder().feed_url("ftp://example.org/feed").build();
        let store = Arc::new(InMemoryMetadataStore::new());

        assert!(matches!(
            CatalogPipeline::new(config, store),
            Err(IngestError::Validation(_))
        ));
    }

    #[test]
    fn test_stats_shape() {
        let stats = PipelineStats { ok: true, n: 3 };
        assert_eq!(serde_json::to_value(stats).unwrap(), serde_json::json!({"ok": true, "n": 3}));
    }

    #[tokio::test]
    async fn test_process_file_parse_error_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pg1.rdf");
        std::fs::write(&path, "<rdf:RDF><pgterms:ebook>").unwrap();

        let store = Arc::new(InMemoryMetadataStore::new());
        let config = IngestConfig::builder().tmp_root(dir.path()).build();
        let pipeline = CatalogPipeline::new(config, store.clone()).unwrap();

        let err = pipeline.process_file(&RecordFile::new(path)).await.unwrap_err();

        assert!(matches!(err, IngestError::Parse(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_process_file_without_id_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pg1.rdf");
        std::fs::write(&path, "<rdf:RDF><pgterms:ebook rdf:about=\"ebooks/x\"/></rdf:RDF>").unwrap();

        let store = Arc::new(InMemoryMetadataStore::new());
        let config = IngestConfig::builder().tmp_root(dir.path()).build();
        let pipeline = CatalogPipeline::new(config, store.clone()).unwrap();

        let err = pipeline.process_file(&RecordFile::new(path)).await.unwrap_err();

        assert!(matches!(err, IngestError::Validation(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_document_id_wins_over_file_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pg99.rdf");
        std::fs::write(&path, "<rdf:RDF><pgterms:ebook rdf:about=\"ebooks/42\"/></rdf:RDF>").unwrap();

        let store = Arc::new(InMemoryMetadataStore::new());
        let config = IngestConfig::builder().tmp_root(dir.path()).build();
        let pipeline = CatalogPipeline::new(config, store.clone()).unwrap();

        let file = RecordFile::new(path);
        assert_eq!(file.catalog_id, Some(99));
        pipeline.process_file(&file).await.unwrap();

        assert!(store.get(42).await.unwrap().is_some());
        assert!(store.get(99).await.unwrap().is_none());
    }
}
