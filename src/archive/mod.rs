//! # Archive Image Format
//!
//! This module defines the on-disk layout of a `.frz` image and the code to
//! write and load it. An image is a single immutable blob:
//!
//! ```text
//! MAGIC | header (JSON, zero padded) | data blocks | index (JSON) | footer (JSON) | footer len (u64 LE) | MAGIC
//! ```
//!
//! Loaded file payloads are [`Blob`] views into the image itself, so an
//! archive opened from a memory map never copies file contents.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builder::BuiltArchive;
use crate::common::{ArchiveMetadata, Backing, Blob, EntryPayload, EntryTable, FileEntry, FORMAT_VERSION};
use crate::compress::{self, CodecParams};
use crate::extract::{self, ExtractReport, Overwrite};
use crate::vfs::{FrozenFs, MountHandle, MountTable};
use crate::{FrozenError, Result};

pub const MAGIC_BYTES: &[u8; 8] = b"FRZNFS01";
/// Size of the zero padded header block following the leading magic.
pub const HEADER_SIZE: u64 = 512;
/// Offset of the first data byte.
pub const DATA_START: u64 = MAGIC_BYTES.len() as u64 + HEADER_SIZE;
/// Footer length plus trailing magic.
const TRAILER_SIZE: usize = 8 + MAGIC_BYTES.len();

/// Represents the header of the image, located right after the leading magic.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// The version of the image format.
    pub version: u32,
    /// Local time the source tree was frozen.
    pub date_frozen: String,
}

/// What a loader should do with the archive when it is activated.
#[derive(Serialize, Deserialize, clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnLoad {
    /// Register the archive as a read-only filesystem at the target.
    #[default]
    Mount,
    /// Copy the archive's files below the target.
    Extract,
}

/// Activation settings stored inside the image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoadAction {
    /// Mount point or extraction destination.
    pub target: String,
    pub on_load: OnLoad,
    /// Only meaningful for [`OnLoad::Extract`].
    pub overwrite: Overwrite,
    /// Suppress all log output while activating.
    pub silent: bool,
}

impl LoadAction {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), on_load: OnLoad::Mount, overwrite: Overwrite::Never, silent: false }
    }

    /// `target` must be absolute and carry no trailing slash (except `/` itself).
    pub fn validate(&self) -> Result<()> {
        if !self.target.starts_with('/') {
            return Err(FrozenError::InvalidArgument(format!("target {} must start with /", self.target)));
        }
        if self.target.len() > 1 && self.target.ends_with('/') {
            return Err(FrozenError::InvalidArgument(format!("target {} must not end with /", self.target)));
        }
        Ok(())
    }
}

/// Where a file's stored bytes live, relative to [`DATA_START`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Folder,
    File {
        offset: u64,
        stored_size: u64,
        size: u64,
        compressed: bool,
        #[serde(default)]
        codec: Option<CodecParams>,
        utf8_width: u8,
    },
}

/// Represents a single entry (file or folder) in the image's central index.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub path: String,
    pub kind: RecordKind,
}

/// Represents the central directory of the image.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArchiveIndex {
    pub metadata: ArchiveMetadata,
    pub load_action: LoadAction,
    pub entries: Vec<IndexRecord>,
}

/// Represents the footer of the image, located right before the trailer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFooter {
    /// The absolute byte offset where the `ArchiveIndex` begins.
    pub index_offset: u64,
    /// The total size of the serialized `ArchiveIndex`.
    pub index_size: u64,
    /// CRC-32 of the serialized index.
    pub index_crc32: u32,
}

/// A writer responsible for constructing a `.frz` image.
///
/// Call [`write_header`](Self::write_header), then [`add_entry`](Self::add_entry)
/// for every row in table order, then [`finalize`](Self::finalize).
pub struct ArchiveWriter<W: Write> {
    writer: BufWriter<W>,
    header: ArchiveHeader,
    index: ArchiveIndex,
    /// Bytes of data written so far.
    data_len: u64,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(output: W, metadata: &ArchiveMetadata, load_action: &LoadAction) -> Result<Self> {
        load_action.validate()?;
        let header = ArchiveHeader { version: FORMAT_VERSION, date_frozen: metadata.date_frozen.clone() };
        Ok(Self {
            writer: BufWriter::new(output),
            header,
            index: ArchiveIndex { metadata: metadata.clone(), load_action: load_action.clone(), entries: Vec::new() },
            data_len: 0,
        })
    }

    /// Writes the leading magic and the fixed-size header block.
    pub fn write_header(&mut self) -> Result<()> {
        let header_bytes = serde_json::to_vec(&self.header)?;
        if header_bytes.len() > HEADER_SIZE as usize {
            return Err(FrozenError::Format(format!("header needs {} bytes, only {} available", header_bytes.len(), HEADER_SIZE)));
        }
        let mut block = Vec::with_capacity(DATA_START as usize);
        block.extend_from_slice(MAGIC_BYTES);
        block.extend_from_slice(&header_bytes);
        block.resize(DATA_START as usize, 0);
        self.writer.write_all(&block)?;
        Ok(())
    }

    /// Appends one entry: the index record, and for files the stored bytes.
    pub fn add_entry(&mut self, path: &str, payload: &EntryPayload) -> Result<()> {
        let kind = match payload {
            EntryPayload::Folder => RecordKind::Folder,
            EntryPayload::File(file) => {
                let stored = file.data.as_ref();
                self.writer.write_all(stored)?;
                let offset = self.data_len;
                self.data_len += stored.len() as u64;
                RecordKind::File {
                    offset,
                    stored_size: stored.len() as u64,
                    size: file.size,
                    compressed: file.compressed,
                    codec: file.codec,
                    utf8_width: file.utf8_width,
                }
            }
        };
        self.index.entries.push(IndexRecord { path: path.to_string(), kind });
        Ok(())
    }

    /// Writes index, footer and trailer. Returns the total image size.
    pub fn finalize(mut self) -> Result<u64> {
        let index_offset = DATA_START + self.data_len;
        let index_bytes = serde_json::to_vec(&self.index)?;
        self.writer.write_all(&index_bytes)?;

        let footer = ArchiveFooter {
            index_offset,
            index_size: index_bytes.len() as u64,
            index_crc32: crc32fast::hash(&index_bytes),
        };
        let footer_bytes = serde_json::to_vec(&footer)?;
        self.writer.write_all(&footer_bytes)?;
        self.writer.write_all(&(footer_bytes.len() as u64).to_le_bytes())?;
        self.writer.write_all(MAGIC_BYTES)?;
        self.writer.flush()?;

        let total = index_offset + index_bytes.len() as u64 + footer_bytes.len() as u64 + TRAILER_SIZE as u64;
        debug!(entries = self.index.entries.len(), data = self.data_len, total, "image finalized");
        Ok(total)
    }

    /// Writes a complete image for `built` in one call.
    pub fn write(built: &BuiltArchive, load_action: &LoadAction, output: W) -> Result<u64> {
        let mut writer = Self::new(output, &built.metadata, load_action)?;
        writer.write_header()?;
        for entry in built.table.iter() {
            writer.add_entry(entry.path, entry.payload)?;
        }
        writer.finalize()
    }
}

/// Writes `built` to a new file at `path`.
pub fn write_image(built: &BuiltArchive, load_action: &LoadAction, path: &Path) -> Result<u64> {
    let file = File::create(path).map_err(|e| FrozenError::io(e, path))?;
    let total = ArchiveWriter::write(built, load_action, file)?;
    info!("wrote {} ({} bytes)", path.display(), total);
    Ok(total)
}

/// Result of [`Archive::activate`].
#[derive(Debug)]
pub enum Activation {
    Mounted(MountHandle),
    Extracted(ExtractReport),
}

/// A loaded, verified image.
#[derive(Debug)]
pub struct Archive {
    header: ArchiveHeader,
    table: EntryTable,
    metadata: ArchiveMetadata,
    load_action: LoadAction,
}

impl Archive {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::parse(Arc::new(Backing::Owned(bytes)))
    }

    /// Memory-maps the image at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| FrozenError::io(e, path))?;
        // SAFETY: the map is read-only; images are treated as immutable once written.
        let map = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| FrozenError::io(e, path))?;
        debug!("mapped {} ({} bytes)", path.display(), map.len());
        Self::parse(Arc::new(Backing::Mapped(map)))
    }

    /// Loads an image linked into the binary, e.g. via `include_bytes!`.
    pub fn from_static(bytes: &'static [u8]) -> Result<Self> {
        Self::parse(Arc::new(Backing::Static(bytes)))
    }

    fn parse(backing: Arc<Backing>) -> Result<Self> {
        let bytes = backing.as_slice();
        let len = bytes.len();
        if len < DATA_START as usize + TRAILER_SIZE {
            return Err(FrozenError::Format(format!("image too short ({len} bytes)")));
        }
        if &bytes[..MAGIC_BYTES.len()] != MAGIC_BYTES || &bytes[len - MAGIC_BYTES.len()..] != MAGIC_BYTES {
            return Err(FrozenError::Format("magic bytes missing".into()));
        }

        let header_block = &bytes[MAGIC_BYTES.len()..DATA_START as usize];
        let header_end = header_block.iter().position(|&b| b == 0).unwrap_or(header_block.len());
        let header: ArchiveHeader = serde_json::from_slice(&header_block[..header_end])?;
        if header.version != FORMAT_VERSION {
            return Err(FrozenError::Format(format!("unsupported format version {}", header.version)));
        }

        let mut footer_len = [0u8; 8];
        footer_len.copy_from_slice(&bytes[len - TRAILER_SIZE..len - MAGIC_BYTES.len()]);
        let footer_end = len - TRAILER_SIZE;
        let footer_start = usize::try_from(u64::from_le_bytes(footer_len))
            .ok()
            .and_then(|n| footer_end.checked_sub(n))
            .filter(|&start| start >= DATA_START as usize)
            .ok_or_else(|| FrozenError::Format("footer length out of range".into()))?;
        let footer: ArchiveFooter = serde_json::from_slice(&bytes[footer_start..footer_end])?;

        let index_range = usize::try_from(footer.index_offset)
            .ok()
            .zip(usize::try_from(footer.index_size).ok())
            .and_then(|(start, size)| Some(start..start.checked_add(size)?))
            .filter(|r| r.start >= DATA_START as usize && r.end <= footer_start)
            .ok_or_else(|| FrozenError::Format("index range out of bounds".into()))?;
        let index_bytes = &bytes[index_range.clone()];
        let crc = crc32fast::hash(index_bytes);
        if crc != footer.index_crc32 {
            return Err(FrozenError::Format(format!(
                "index checksum mismatch (stored {:08x}, computed {crc:08x})",
                footer.index_crc32
            )));
        }
        let index: ArchiveIndex = serde_json::from_slice(index_bytes)?;
        if index.metadata.version != FORMAT_VERSION {
            return Err(FrozenError::Format(format!("unsupported metadata version {}", index.metadata.version)));
        }

        let data_len = (index_range.start - DATA_START as usize) as u64;
        let mut table = EntryTable::new();
        for record in index.entries {
            let payload = match record.kind {
                RecordKind::Folder => EntryPayload::Folder,
                RecordKind::File { offset, stored_size, size, compressed, codec, utf8_width } => {
                    let in_bounds = offset.checked_add(stored_size).map_or(false, |end| end <= data_len);
                    if !in_bounds {
                        return Err(FrozenError::Format(format!("data of {} lies outside the data region", record.path)));
                    }
                    if !compressed && stored_size != size {
                        return Err(FrozenError::Format(format!("raw entry {} has mismatched sizes", record.path)));
                    }
                    if compressed && size > compress::max_inflated_size(stored_size) {
                        return Err(FrozenError::Format(format!(
                            "entry {} claims {size} bytes from {stored_size} compressed",
                            record.path
                        )));
                    }
                    let start = (DATA_START + offset) as usize;
                    EntryPayload::File(FileEntry {
                        data: Blob::new(Arc::clone(&backing), start..start + stored_size as usize),
                        compressed,
                        size,
                        compressed_size: stored_size,
                        codec,
                        utf8_width,
                    })
                }
            };
            table
                .insert(record.path.clone(), payload)
                .map_err(|e| FrozenError::Format(format!("bad index record {}: {e}", record.path)))?;
        }

        let recount = ArchiveMetadata::for_table(&table, index.metadata.date_frozen.clone());
        if recount != index.metadata {
            return Err(FrozenError::Format(format!(
                "metadata records {} entries of {} bytes, index holds {} of {}",
                index.metadata.files_folders, index.metadata.sum_size, recount.files_folders, recount.sum_size
            )));
        }

        debug!(entries = table.len(), version = header.version, "image loaded");
        Ok(Self { header, table, metadata: index.metadata, load_action: index.load_action })
    }

    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    pub fn metadata(&self) -> &ArchiveMetadata {
        &self.metadata
    }

    pub fn load_action(&self) -> &LoadAction {
        &self.load_action
    }

    pub fn into_filesystem(self) -> FrozenFs {
        FrozenFs::new(self.table, &self.metadata)
    }

    /// Performs the stored [`LoadAction`].
    pub fn activate(self, mounts: &mut MountTable) -> Result<Activation> {
        if self.load_action.silent {
            tracing::subscriber::with_default(tracing::subscriber::NoSubscriber::default(), || self.perform(mounts))
        } else {
            self.perform(mounts)
        }
    }

    fn perform(self, mounts: &mut MountTable) -> Result<Activation> {
        let action = self.load_action.clone();
        match action.on_load {
            OnLoad::Mount => {
                let handle = mounts.mount(self.into_filesystem(), &action.target)?;
                Ok(Activation::Mounted(handle))
            }
            OnLoad::Extract => {
                let report = extract::extract(&self.table, Path::new(&action.target), action.overwrite)?;
                Ok(Activation::Extracted(report))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{freeze_file, BuildOptions, BuildReport};
    use crate::vfs::Filesystem;

    fn built(compress: bool) -> BuiltArchive {
        let options = BuildOptions { compress, ..BuildOptions::default() };
        let mut table = EntryTable::new();
        table.insert("/a.txt".into(), EntryPayload::File(freeze_file("αβγ ".repeat(64).into_bytes(), &options).unwrap())).unwrap();
        table.insert("/dir".into(), EntryPayload::Folder).unwrap();
        table.insert("/dir/b.bin".into(), EntryPayload::File(freeze_file(vec![0, 159, 146, 150], &options).unwrap())).unwrap();
        table.insert("/dir/empty.txt".into(), EntryPayload::File(freeze_file(Vec::new(), &options).unwrap())).unwrap();
        let metadata = ArchiveMetadata::for_table(&table, "2024/01/02 03:04:05".into());
        BuiltArchive { table, metadata, report: BuildReport::default() }
    }

    fn image(compress: bool, action: &LoadAction) -> Vec<u8> {
        let mut out = Vec::new();
        ArchiveWriter::write(&built(compress), action, &mut out).unwrap();
        out
    }

    #[test]
    fn layout_markers() {
        let bytes = image(false, &LoadAction::new("/fz"));
        assert_eq!(&bytes[..8], MAGIC_BYTES);
        assert_eq!(&bytes[bytes.len() - 8..], MAGIC_BYTES);

        let mut len = [0u8; 8];
        len.copy_from_slice(&bytes[bytes.len() - 16..bytes.len() - 8]);
        let footer_end = bytes.len() - 16;
        let footer: ArchiveFooter =
            serde_json::from_slice(&bytes[footer_end - u64::from_le_bytes(len) as usize..footer_end]).unwrap();
        assert!(footer.index_offset >= DATA_START);
    }

    #[test]
    fn round_trip_preserves_entries() {
        for compress in [false, true] {
            let source = built(compress);
            let mut action = LoadAction::new("/fz");
            action.on_load = OnLoad::Extract;
            action.overwrite = Overwrite::Always;
            let archive = Archive::from_bytes(image(compress, &action)).unwrap();

            assert_eq!(archive.metadata(), &source.metadata);
            assert_eq!(archive.load_action(), &action);
            assert_eq!(archive.header().date_frozen, "2024/01/02 03:04:05");
            let paths: Vec<_> = archive.table().iter().map(|e| e.path.to_string()).collect();
            assert_eq!(paths, vec!["/a.txt", "/dir", "/dir/b.bin", "/dir/empty.txt"]);

            for (path, original) in source.table.files() {
                let loaded = archive.table().get(path).and_then(EntryPayload::as_file).unwrap();
                assert_eq!(loaded.data.as_ref(), original.data.as_ref());
                assert_eq!(loaded.compressed, original.compressed);
                assert_eq!(loaded.size, original.size);
                assert_eq!(loaded.utf8_width, original.utf8_width);
            }
        }
    }

    #[test]
    fn static_and_mapped_images_load() {
        let bytes = image(true, &LoadAction::new("/fz"));
        let leaked: &'static [u8] = Box::leak(bytes.clone().into_boxed_slice());
        let archive = Archive::from_static(leaked).unwrap();
        let fs = archive.into_filesystem();
        assert_eq!(fs.open_text("/a.txt").unwrap().read_to_string().unwrap(), "αβγ ".repeat(64));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.frz");
        std::fs::write(&path, &bytes).unwrap();
        let archive = Archive::open(&path).unwrap();
        assert_eq!(archive.into_filesystem().open_binary("/dir/b.bin").unwrap().read_all().unwrap(), vec![0, 159, 146, 150]);
    }

    #[test]
    fn corrupt_images_rejected() {
        let good = image(false, &LoadAction::new("/fz"));

        assert!(matches!(Archive::from_bytes(good[..good.len() - 1].to_vec()), Err(FrozenError::Format(_))));
        assert!(matches!(Archive::from_bytes(b"FRZNFS01".to_vec()), Err(FrozenError::Format(_))));

        let mut bad_magic = good.clone();
        bad_magic[0] = b'X';
        assert!(matches!(Archive::from_bytes(bad_magic), Err(FrozenError::Format(_))));

        // Flip one byte inside the index: the checksum no longer matches.
        let mut bad_index = good.clone();
        let at = good.windows(7).position(|w| w == b"entries").unwrap();
        bad_index[at] = b'E';
        assert!(matches!(Archive::from_bytes(bad_index), Err(FrozenError::Format(_))));

        let mut bad_version = good;
        let at = bad_version.windows(11).position(|w| w == b"\"version\":1").unwrap();
        bad_version[at + 10] = b'7';
        assert!(matches!(Archive::from_bytes(bad_version), Err(FrozenError::Format(_))));
    }

    /// Writes a single-record image whose record is edited by `tamper`.
    fn crafted(path: &str, compress: bool, tamper: impl FnOnce(&mut RecordKind)) -> Result<Archive> {
        let source = built(compress);
        let file = source.table.get("/a.txt").unwrap();
        let metadata = ArchiveMetadata {
            sum_size: file.as_file().unwrap().size,
            files_folders: 1,
            ..source.metadata.clone()
        };
        let mut out = Vec::new();
        let mut writer = ArchiveWriter::new(&mut out, &metadata, &LoadAction::new("/fz")).unwrap();
        writer.write_header().unwrap();
        writer.add_entry(path, file).unwrap();
        if let Some(record) = writer.index.entries.last_mut() {
            tamper(&mut record.kind);
            if let RecordKind::File { size, .. } = record.kind {
                writer.index.metadata.sum_size = size;
            }
        }
        writer.finalize().unwrap();
        Archive::from_bytes(out)
    }

    #[test]
    fn single_record_image_loads() {
        let archive = crafted("/a.txt", true, |_| {}).unwrap();
        assert_eq!(archive.table().len(), 1);
    }

    #[test]
    fn escaping_paths_rejected() {
        for path in ["/../escaped.txt", "/x/../../escaped.txt", "/./a.txt", "/a.txt/", "a.txt"] {
            assert!(matches!(crafted(path, false, |_| {}), Err(FrozenError::Format(_))), "{path} loaded");
        }
    }

    #[test]
    fn implausible_size_rejected() {
        let result = crafted("/a.txt", true, |kind| {
            if let RecordKind::File { size, .. } = kind {
                *size = u64::MAX;
            }
        });
        assert!(matches!(result, Err(FrozenError::Format(_))));

        // Plausible but wrong: the load succeeds, reading fails cleanly.
        let archive = crafted("/a.txt", true, |kind| {
            if let RecordKind::File { size, .. } = kind {
                *size += 1;
            }
        })
        .unwrap();
        let fs = archive.into_filesystem();
        assert!(matches!(fs.open_text("/a.txt"), Err(FrozenError::Codec(_))));
    }

    #[test]
    fn metadata_checked_against_index() {
        let tampers: [fn(&mut ArchiveMetadata); 2] = [|m| m.sum_size += 1, |m| m.files_folders -= 1];
        for tamper in tampers {
            let mut source = built(false);
            tamper(&mut source.metadata);
            let mut out = Vec::new();
            ArchiveWriter::write(&source, &LoadAction::new("/fz"), &mut out).unwrap();
            assert!(matches!(Archive::from_bytes(out), Err(FrozenError::Format(_))));
        }
    }

    #[test]
    fn data_range_checked() {
        let source = built(false);
        let mut out = Vec::new();
        let mut writer = ArchiveWriter::new(&mut out, &source.metadata, &LoadAction::new("/fz")).unwrap();
        writer.write_header().unwrap();
        writer.add_entry("/a.txt", source.table.get("/a.txt").unwrap()).unwrap();
        // Claim more bytes than the data region holds.
        if let Some(IndexRecord { kind: RecordKind::File { stored_size, size, .. }, .. }) = writer.index.entries.last_mut() {
            *stored_size += 10;
            *size += 10;
        }
        writer.finalize().unwrap();
        assert!(matches!(Archive::from_bytes(out), Err(FrozenError::Format(_))));
    }

    #[test]
    fn load_action_validation() {
        assert!(LoadAction::new("/").validate().is_ok());
        assert!(LoadAction::new("/fz").validate().is_ok());
        assert!(LoadAction::new("fz").validate().is_err());
        assert!(LoadAction::new("/fz/").validate().is_err());
        let mut out = Vec::new();
        assert!(ArchiveWriter::new(&mut out, &built(false).metadata, &LoadAction::new("rel")).is_err());
    }

    #[test]
    fn activate_mounts_or_extracts() {
        let mut mounts = MountTable::new();
        let archive = Archive::from_bytes(image(true, &LoadAction::new("/fz"))).unwrap();
        let handle = match archive.activate(&mut mounts).unwrap() {
            Activation::Mounted(handle) => handle,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(mounts.listdir("/fz/dir").unwrap(), vec!["b.bin", "empty.txt"]);
        let fs = mounts.unmount(handle).unwrap();
        assert_eq!(fs.listdir("/").unwrap(), vec!["a.txt", "dir"]);

        let dir = tempfile::tempdir().unwrap();
        let mut action = LoadAction::new(dir.path().join("out").to_string_lossy().into_owned());
        action.on_load = OnLoad::Extract;
        action.silent = true;
        let archive = Archive::from_bytes(image(true, &action)).unwrap();
        match archive.activate(&mut mounts).unwrap() {
            Activation::Extracted(report) => assert_eq!(report.files_written, 3),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(std::fs::read(dir.path().join("out/dir/b.bin")).unwrap(), vec![0, 159, 146, 150]);
    }
}
