//! Recursive discovery of RDF record files

use crate::ingest::common::decompression::INNER_ARCHIVE_EXTENSION;
use crate::ingest::{IngestError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One expanded catalog document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFile {
    pub path: PathBuf,
    /// Id from the `pg<id>.rdf` naming convention, when the name follows it
    pub catalog_id: Option<u64>,
}

impl RecordFile {
    pub fn new(path: PathBuf) -> Self {
        let catalog_id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix("pg"))
            .and_then(|digits| digits.parse().ok());

        Self { path, catalog_id }
    }
}

/// Walks an expansion directory and yields every record file in it
#[derive(Debug, Clone)]
pub struct FileDiscoverer {
    excluded_extension: String,
}

impl Default for FileDiscoverer {
    fn default() -> Self {
        Self {
            excluded_extension: INNER_ARCHIVE_EXTENSION.to_string(),
        }
    }
}

impl FileDiscoverer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lazily list every regular file below `expansion_dir`
    ///
    /// Files carrying the inner archive's extension are skipped. The iterator
    /// is one-shot and yields in filesystem order.
    pub fn discover(&self, expansion_dir: &Path) -> impl Iterator<Item = Result<RecordFile>> {
        let excluded = self.excluded_extension.clone();

        WalkDir::new(expansion_dir)
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let is_excluded = entry
                        .path()
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(excluded.as_str()));
                    (!is_excluded).then(|| Ok(RecordFile::new(entry.into_path())))
                },
                Ok(_) => None,
                Err(e) => Some(Err(IngestError::Io(e.into()))),
            })
    }
}
