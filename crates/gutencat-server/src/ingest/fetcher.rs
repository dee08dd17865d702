// Catalog feed downloader and expander

use crate::ingest::common::decompression;
use crate::ingest::{IngestConfig, IngestError, Result};
use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Streams the catalog archive to disk and expands it
///
/// No retries and no resumption: any failure in download, stage 1 or stage 2
/// is returned as-is and whatever was already written stays on disk.
pub struct ArchiveFetcher {
    client: Client,
}

impl ArchiveFetcher {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        config.validate().map_err(IngestError::Validation)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Download `feed_url` to `archive_path` and expand it into `expansion_dir`
    pub async fn fetch_and_expand(
        &self,
        feed_url: &str,
        archive_path: &Path,
        expansion_dir: &Path,
    ) -> Result<PathBuf> {
        info!("Downloading catalog feed from: {}", feed_url);
        let bytes = self.download(feed_url, archive_path).await?;
        info!(
            "Downloaded catalog feed: {} bytes ({} MB) to {}",
            bytes,
            bytes / (1024 * 1024),
            archive_path.display()
        );

        let archive = archive_path.to_path_buf();
        let target = expansion_dir.to_path_buf();
        let inner = tokio::task::spawn_blocking(move || {
            decompression::expand_outer(&archive, &target)
        })
        .await??;
        info!("Expanded outer container to {}", inner.display());

        let target = expansion_dir.to_path_buf();
        let entries =
            tokio::task::spawn_blocking(move || decompression::unpack_tar(&inner, &target))
                .await??;
        info!("Unpacked {} entries into {}", entries, expansion_dir.display());

        Ok(expansion_dir.to_path_buf())
    }

    /// Stream the response body to disk chunk by chunk
    async fn download(&self, url: &str, archive_path: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::Network(format!(
                "HTTP error {} fetching {}",
                response.status(),
                url
            )));
        }

        if let Some(parent) = archive_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(archive_path).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        debug!("Wrote {} bytes to {}", written, archive_path.display());

        Ok(written)
    }
}
