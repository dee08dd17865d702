// Catalog ingestion configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Public Project Gutenberg RDF catalog feed
pub const DEFAULT_FEED_URL: &str = "https://gutenberg.org/cache/epub/feeds/rdf-files.tar.zip";

/// Default HTTP timeout for the feed download (the archive is ~100MB)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 1800;

/// Configuration for a catalog ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// URL of the compressed RDF catalog
    pub feed_url: String,

    /// Writable root for session archives and expansion directories.
    /// Nothing under it is removed after a run.
    pub tmp_root: PathBuf,

    /// HTTP timeout in seconds for the whole download
    pub timeout_secs: u64,

    /// User agent sent with the feed request
    pub user_agent: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            feed_url: DEFAULT_FEED_URL.to_string(),
            tmp_root: std::env::temp_dir().join("gutencat"),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: format!("gutencat/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl IngestConfig {
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Load from environment variables, falling back to defaults
    ///
    /// - `CATALOG_FEED_URL`
    /// - `CATALOG_TMP_DIR`
    /// - `CATALOG_HTTP_TIMEOUT`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        IngestConfig {
            feed_url: std::env::var("CATALOG_FEED_URL").unwrap_or(defaults.feed_url),
            tmp_root: std::env::var("CATALOG_TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.tmp_root),
            timeout_secs: std::env::var("CATALOG_HTTP_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            user_agent: defaults.user_agent,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.feed_url.is_empty() {
            return Err("Feed URL cannot be empty".to_string());
        }

        if !(self.feed_url.starts_with("http://") || self.feed_url.starts_with("https://")) {
            return Err(format!("Feed URL must be http(s): {}", self.feed_url));
        }

        if self.tmp_root.as_os_str().is_empty() {
            return Err("Temp directory cannot be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Builder for IngestConfig
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    feed_url: Option<String>,
    tmp_root: Option<PathBuf>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

impl IngestConfigBuilder {
    pub fn feed_url(mut self, url: impl Into<String>) -> Self {
        self.feed_url = Some(url.into());
        self
    }

    pub fn tmp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.tmp_root = Some(root.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> IngestConfig {
        let defaults = IngestConfig::default();
        IngestConfig {
            feed_url: self.feed_url.unwrap_or(defaults.feed_url),
            tmp_root: self.tmp_root.unwrap_or(defaults.tmp_root),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}
