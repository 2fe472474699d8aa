//! # Archive Builder
//!
//! Scans a source directory in one pass and turns it into an ordered
//! [`EntryTable`] plus [`ArchiveMetadata`]. File payloads are optionally
//! compressed; a compressed payload is only kept when it is strictly smaller
//! than the raw bytes.

use std::fs;
use std::path::{Component, Path};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::common::{ArchiveMetadata, Blob, EntryPayload, EntryTable, FileEntry, MAX_FILENAME_LEN};
use crate::compress::{self, CodecParams};
use crate::{FrozenError, Result};

/// Holds all configuration options for a build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Try to compress every file.
    pub compress: bool,
    /// Level and window used when `compress` is set.
    pub codec: CodecParams,
}

impl BuildOptions {
    pub fn validate(&self) -> Result<()> {
        self.codec.validate()
    }
}

/// Statistics collected while building.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub files: u64,
    pub folders: u64,
    /// Sum of original file sizes.
    pub sum_size: u64,
    /// Sum of stored (possibly compressed) sizes.
    pub sum_stored: u64,
    /// Files whose compressed form was kept.
    pub compressed_files: u64,
}

impl BuildReport {
    /// Stored/original in percent, `None` for an archive with no file bytes.
    pub fn ratio_percent(&self) -> Option<f64> {
        (self.sum_size != 0).then(|| self.sum_stored as f64 / self.sum_size as f64 * 100.0)
    }
}

/// Output of [`build`].
#[derive(Debug, Clone)]
pub struct BuiltArchive {
    pub table: EntryTable,
    pub metadata: ArchiveMetadata,
    pub report: BuildReport,
}

/// Builds the entry table for everything below `source_root`.
///
/// Empty folders are included, the root itself is not. Any archive path of
/// [`MAX_FILENAME_LEN`] characters or more aborts the whole build.
pub fn build(source_root: &Path, options: &BuildOptions) -> Result<BuiltArchive> {
    options.validate()?;
    if !source_root.is_dir() {
        return Err(FrozenError::NotADirectory(source_root.display().to_string()));
    }

    let mut table = EntryTable::new();
    let mut report = BuildReport::default();

    for item in WalkDir::new(source_root).min_depth(1).follow_links(true).sort_by_file_name() {
        let item = item.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_default();
            match e.into_io_error() {
                Some(source) => FrozenError::io(source, path),
                None => FrozenError::InvalidArgument(format!("filesystem loop at {}", path.display())),
            }
        })?;
        let relative = item
            .path()
            .strip_prefix(source_root)
            .map_err(|_| FrozenError::InvalidArgument(format!("{} is outside the source", item.path().display())))?;
        let archive_path = to_archive_path(relative)?;

        let len = archive_path.chars().count();
        if len >= MAX_FILENAME_LEN {
            return Err(FrozenError::PathTooLong { path: archive_path, len, max: MAX_FILENAME_LEN });
        }

        if item.file_type().is_dir() {
            debug!(source = %item.path().display(), path = %archive_path, "appended folder");
            table.insert(archive_path, EntryPayload::Folder)?;
            report.folders += 1;
            continue;
        }

        let raw = fs::read(item.path()).map_err(|e| FrozenError::io(e, item.path()))?;
        let entry = freeze_file(raw, options)?;
        report.files += 1;
        report.sum_size += entry.size;
        report.sum_stored += entry.compressed_size;
        if entry.compressed {
            report.compressed_files += 1;
            debug!(
                source = %item.path().display(),
                path = %archive_path,
                size = entry.size,
                ratio = %format!("{:.0}%", entry.compressed_size as f64 / entry.size as f64 * 100.0),
                "appended file"
            );
        } else {
            debug!(source = %item.path().display(), path = %archive_path, size = entry.size, "appended file");
        }
        table.insert(archive_path, EntryPayload::File(entry))?;
    }

    let date_frozen = chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string();
    let metadata = ArchiveMetadata::for_table(&table, date_frozen);

    info!(
        sum_size = report.sum_size,
        files = report.files,
        folders = report.folders,
        "sum of file sizes {} bytes, {} files {} folders",
        report.sum_size,
        report.files,
        report.folders
    );
    if options.compress {
        if let Some(ratio) = report.ratio_percent() {
            info!("sum of compressed sizes {}, compressed/original={:.1}%", report.sum_stored, ratio);
        }
    }

    Ok(BuiltArchive { table, metadata, report })
}

/// Turns raw file bytes into a table entry, compressing when it pays off.
pub fn freeze_file(raw: Vec<u8>, options: &BuildOptions) -> Result<FileEntry> {
    let size = raw.len() as u64;
    let utf8_width = utf8_width(&raw);

    if options.compress {
        let packed = compress::compress(&raw, options.codec)?;
        if (packed.len() as u64) < size {
            return Ok(FileEntry {
                compressed_size: packed.len() as u64,
                data: Blob::from_vec(packed),
                compressed: true,
                size,
                codec: Some(options.codec),
                utf8_width,
            });
        }
    }

    Ok(FileEntry { data: Blob::from_vec(raw), compressed: false, size, compressed_size: size, codec: None, utf8_width })
}

/// Longest UTF-8 sequence in `data`; 4 when it isn't valid UTF-8, 1 when empty.
pub fn utf8_width(data: &[u8]) -> u8 {
    match std::str::from_utf8(data) {
        Ok(text) => text.chars().map(char::len_utf8).max().unwrap_or(1) as u8,
        Err(_) => 4,
    }
}

/// `/` followed by the POSIX form of `relative`.
fn to_archive_path(relative: &Path) -> Result<String> {
    let mut out = String::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str().ok_or_else(|| {
                    FrozenError::InvalidArgument(format!("file name is not valid UTF-8: {}", relative.display()))
                })?;
                out.push('/');
                out.push_str(name);
            }
            Component::CurDir => {}
            _ => {
                return Err(FrozenError::InvalidArgument(format!(
                    "unexpected path component in {}",
                    relative.display()
                )))
            }
        }
    }
    Ok(out)
}
