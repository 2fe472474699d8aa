//! # Extraction Module
//!
//! Materializes an entry table onto real storage. `extract` always runs and
//! honours an overwrite policy; `deploy` runs once, skipping entirely when the
//! destination already has content.
//!
//! Entries are written in table order, which places every folder before its
//! children, so no parent lookup is needed.

use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::common::{EntryPayload, EntryTable, FileEntry};
use crate::compress::Inflater;
use crate::fsx as fs;
use crate::{FrozenError, Result};

/// Bytes moved per write while extracting a file.
pub const TRANSFER_BUFFER: usize = 256;

/// What to do with files that already exist at the destination.
#[derive(Serialize, Deserialize, clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Overwrite {
    /// Only write files that don't exist yet.
    #[default]
    Never,
    /// Replace every file.
    Always,
}

/// Counters from one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub files_written: u64,
    pub files_skipped: u64,
    pub folders_created: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    Deployed(ExtractReport),
    /// The destination already had content; nothing was written.
    AlreadyDeployed,
}

/// Copies every entry of `table` below `destination`.
///
/// The first failure writing a file aborts the pass; files already written
/// stay in place.
pub fn extract(table: &EntryTable, destination: &Path, overwrite: Overwrite) -> Result<ExtractReport> {
    info!("extracting files to {}", destination.display());
    let mut report = ExtractReport::default();
    let created = fs::ensure_dir_all(destination).map_err(|e| FrozenError::io(e, destination))?;
    for folder in created {
        debug!("folder {} created", folder.display());
        report.folders_created += 1;
    }

    for entry in table.iter() {
        let dest = destination_path(destination, entry.path)?;
        match entry.payload {
            EntryPayload::Folder => {
                if fs::ensure_dir(&dest).map_err(|e| FrozenError::io(e, &dest))? {
                    debug!("folder {} created", dest.display());
                    report.folders_created += 1;
                }
            }
            EntryPayload::File(file) => {
                if overwrite == Overwrite::Never && fs::symlink_metadata(&dest).is_ok() {
                    warn!("file {} exists, not extracted", dest.display());
                    report.files_skipped += 1;
                    continue;
                }
                debug!("extracting file {}", dest.display());
                if let Err(e) = write_file(file, &dest) {
                    error!("file {} not copied: {}", dest.display(), e);
                    return Err(e);
                }
                report.files_written += 1;
            }
        }
    }

    info!(
        files_written = report.files_written,
        files_skipped = report.files_skipped,
        folders_created = report.folders_created,
        "extraction to {} finished",
        destination.display()
    );
    Ok(report)
}

/// One-time copy: does nothing when `destination` already has entries.
pub fn deploy(table: &EntryTable, destination: &Path) -> Result<DeployOutcome> {
    if fs::is_populated_dir(destination) {
        info!("target {} not empty, no files copied", destination.display());
        return Ok(DeployOutcome::AlreadyDeployed);
    }
    extract(table, destination, Overwrite::Always).map(DeployOutcome::Deployed)
}

/// `destination` + entry path. Only plain components are accepted, so the
/// result never leaves `destination`.
fn destination_path(destination: &Path, entry_path: &str) -> Result<PathBuf> {
    let relative = Path::new(entry_path.trim_start_matches('/'));
    if relative.as_os_str().is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(FrozenError::InvalidArgument(format!(
            "entry {entry_path:?} escapes the destination {}",
            destination.display()
        )));
    }
    Ok(destination.join(relative))
}

/// Streams one payload to `dest`, inflating if needed, through a fixed
/// transfer buffer.
fn write_file(file: &FileEntry, dest: &Path) -> Result<()> {
    let mut out = fs::File::create(dest).map_err(|e| FrozenError::io(e, dest))?;
    let stored: &[u8] = file.data.as_ref();
    let mut source: Box<dyn Read + '_> = if file.compressed { Box::new(Inflater::new(stored)) } else { Box::new(stored) };

    let mut buffer = [0u8; TRANSFER_BUFFER];
    loop {
        let n = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FrozenError::from(e)),
        };
        out.write_all(&buffer[..n]).map_err(|e| FrozenError::io(e, dest))?;
    }
    out.flush().map_err(|e| FrozenError::io(e, dest))?;
    Ok(())
}
