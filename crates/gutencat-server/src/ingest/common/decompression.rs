//! Two-stage archive expansion for the catalog feed
//!
//! The feed is an outer compressed container wrapping a single tar file:
//!
//! - **Zip** (`rdf-files.tar.zip`): extracted with the zip crate
//! - **Gzip** (`rdf-files.tar.gz`): decompressed with flate2, all members
//!
//! Either way stage 1 leaves the tar at [`INNER_ARCHIVE_NAME`] inside the
//! expansion directory, and stage 2 unpacks it in place. Everything here is
//! blocking file I/O; async callers run it on `spawn_blocking`.

use crate::ingest::{IngestError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the inner tape archive, relative to the expansion directory
pub const INNER_ARCHIVE_NAME: &str = "rdf-files.tar";

/// Extension of the inner archive; discovery skips files carrying it
pub const INNER_ARCHIVE_EXTENSION: &str = "tar";

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Outer container format, sniffed from the first bytes of the download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Zip,
    Gzip,
}

/// Identify the outer container from its magic bytes
pub fn detect_format(archive_path: &Path) -> Result<ContainerFormat> {
    let mut header = [0u8; 4];
    let mut file = File::open(archive_path)?;
    let read = file.read(&mut header)?;

    if read >= ZIP_MAGIC.len() && header == ZIP_MAGIC {
        Ok(ContainerFormat::Zip)
    } else if read >= GZIP_MAGIC.len() && header[..2] == GZIP_MAGIC {
        Ok(ContainerFormat::Gzip)
    } else {
        Err(IngestError::Archive(format!(
            "Unrecognized container format for {} (header {:02x?})",
            archive_path.display(),
            &header[..read]
        )))
    }
}

/// Stage 1: expand the outer container into `expansion_dir`
///
/// Returns the path of the inner tar archive.
pub fn expand_outer(archive_path: &Path, expansion_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(expansion_dir)?;
    let inner_path = expansion_dir.join(INNER_ARCHIVE_NAME);

    match detect_format(archive_path)? {
        ContainerFormat::Zip => unzip_into(archive_path, expansion_dir)?,
        ContainerFormat::Gzip => gunzip_to(archive_path, &inner_path)?,
    }

    if !inner_path.is_file() {
        return Err(IngestError::Archive(format!(
            "Outer archive {} did not contain {}",
            archive_path.display(),
            INNER_ARCHIVE_NAME
        )));
    }

    debug!("Expanded outer archive {} -> {}", archive_path.display(), inner_path.display());
    Ok(inner_path)
}

fn unzip_into(archive_path: &Path, expansion_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    debug!("Zip archive has {} entries", archive.len());
    archive.extract(expansion_dir)?;
    Ok(())
}

fn gunzip_to(archive_path: &Path, target: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(file));
    let mut out = File::create(target)?;
    let bytes = copy_decompressed(&mut decoder, &mut out)?;
    debug!("Decompressed gzip container to {} bytes", bytes);
    Ok(())
}

/// Copy decoded bytes to `out`
///
/// Read failures are corrupt input and surface as `Archive`; write failures
/// are local I/O and surface as `Io`.
fn copy_decompressed<R: Read, W: Write>(decoder: &mut R, out: &mut W) -> Result<u64> {
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let n = match decoder.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(IngestError::Archive(format!(
                    "Failed to decompress gzip data: {}",
                    e
                )))
            },
        };
        out.write_all(&buf[..n])?;
        total += n as u64;
    }

    out.flush()?;
    Ok(total)
}

/// Stage 2: unpack the tar archive into `expansion_dir`
///
/// Returns the number of entries unpacked. Entries whose paths would escape
/// the expansion directory are skipped by `unpack_in`.
pub fn unpack_tar(tar_path: &Path, expansion_dir: &Path) -> Result<usize> {
    let file = File::open(tar_path)?;
    let mut archive = tar::Archive::new(BufReader::new(file));
    let mut unpacked = 0usize;

    let entries = archive
        .entries()
        .map_err(|e| IngestError::Archive(format!("Failed to read tar entries: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| IngestError::Archive(format!("Failed to read tar entry: {}", e)))?;
        let unpacked_entry = entry.unpack_in(expansion_dir).map_err(|e| {
            IngestError::Archive(format!("Failed to unpack tar entry: {}", e))
        })?;
        if unpacked_entry {
            unpacked += 1;
        }
    }

    debug!("Unpacked {} tar entries into {}", unpacked, expansion_dir.display());
    Ok(unpacked)
}
