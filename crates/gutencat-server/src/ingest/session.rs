//! Per-run session identity and temp-path layout

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One pipeline run's scratch space
///
/// The archive and expansion directory live under the configured temp root
/// and are left on disk when the run finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub archive_path: PathBuf,
    pub expansion_dir: PathBuf,
}

impl Session {
    pub fn new(tmp_root: &Path) -> Self {
        Self::with_id(tmp_root, Uuid::new_v4())
    }

    pub fn with_id(tmp_root: &Path, id: Uuid) -> Self {
        Self {
            id,
            archive_path: tmp_root.join(format!("{}.archive", id)),
            expansion_dir: tmp_root.join(id.to_string()),
        }
    }
}
