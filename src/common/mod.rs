//! Common types shared by the builder, the image reader, the mounted view and
//! the extractor: entries, the ordered entry table, archive metadata and the
//! zero-copy byte blobs file payloads live in.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::compress::CodecParams;

/// Archive paths must stay strictly below this many characters.
pub const MAX_FILENAME_LEN: usize = 255;

/// Incremented whenever the entry or table layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Immutable storage that file payloads point into.
pub enum Backing {
    Owned(Vec<u8>),
    Mapped(memmap2::Mmap),
    Static(&'static [u8]),
}

impl Backing {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Backing::Owned(v) => v,
            Backing::Mapped(m) => m,
            Backing::Static(s) => s,
        }
    }
}

/// A cheap, clonable view of a byte range inside a shared [`Backing`].
///
/// Every stream opened on the mounted view holds one of these, so opening a
/// file never copies its stored bytes.
#[derive(Clone)]
pub struct Blob {
    backing: Arc<Backing>,
    range: Range<usize>,
}

impl Blob {
    pub fn new(backing: Arc<Backing>, range: Range<usize>) -> Self {
        debug_assert!(range.end <= backing.as_slice().len());
        Self { backing, range }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        let len = data.len();
        Self::new(Arc::new(Backing::Owned(data)), 0..len)
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.backing.as_slice()[self.range.clone()]
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob({} bytes @ {:?})", self.len(), self.range)
    }
}

/// Payload of a file entry.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Stored bytes: raw, or a zlib stream when `compressed` is set.
    pub data: Blob,
    pub compressed: bool,
    /// Original (uncompressed) size.
    pub size: u64,
    /// Size as stored. Equal to `size` for raw entries.
    pub compressed_size: u64,
    /// Codec parameters used, present only when `compressed`.
    pub codec: Option<CodecParams>,
    /// Longest UTF-8 sequence in the file, 4 when the file isn't valid UTF-8.
    pub utf8_width: u8,
}

#[derive(Debug, Clone)]
pub enum EntryPayload {
    Folder,
    File(FileEntry),
}

impl EntryPayload {
    pub fn is_folder(&self) -> bool {
        matches!(self, EntryPayload::Folder)
    }

    pub fn as_file(&self) -> Option<&FileEntry> {
        match self {
            EntryPayload::File(f) => Some(f),
            EntryPayload::Folder => None,
        }
    }

    /// Original size for files, 0 for folders.
    pub fn size(&self) -> u64 {
        self.as_file().map_or(0, |f| f.size)
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryEntry<'a> {
    pub path: &'a str,
    pub payload: &'a EntryPayload,
}

/// Ordered mapping from absolute archive path to payload.
///
/// Byte-lexicographic order puts every folder before anything nested inside
/// it, which extraction relies on to create parents first.
#[derive(Debug, Clone, Default)]
pub struct EntryTable {
    entries: BTreeMap<String, EntryPayload>,
}

impl EntryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, rejecting the root, non-canonical paths and duplicates.
    pub fn insert(&mut self, path: String, payload: EntryPayload) -> crate::Result<()> {
        if !is_canonical(&path) {
            return Err(crate::FrozenError::InvalidArgument(format!(
                "entry path must be absolute, canonical and not the root: {path:?}"
            )));
        }
        if path.chars().count() >= MAX_FILENAME_LEN {
            return Err(crate::FrozenError::PathTooLong {
                len: path.chars().count(),
                path,
                max: MAX_FILENAME_LEN,
            });
        }
        match self.entries.entry(path) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(payload);
                Ok(())
            }
            btree_map::Entry::Occupied(slot) => Err(crate::FrozenError::AlreadyExists(slot.key().clone())),
        }
    }

    pub fn get(&self, path: &str) -> Option<&EntryPayload> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = DirectoryEntry<'_>> {
        self.entries.iter().map(|(path, payload)| DirectoryEntry { path, payload })
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &FileEntry)> {
        self.entries
            .iter()
            .filter_map(|(path, payload)| payload.as_file().map(|f| (path.as_str(), f)))
    }

    /// Sum of original sizes of all files.
    pub fn total_size(&self) -> u64 {
        self.files().map(|(_, f)| f.size).sum()
    }
}

/// Build-time facts about an archive. Produced once, never modified.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMetadata {
    pub version: u32,
    /// Local build time, `YYYY/MM/DD HH:MM:SS`.
    pub date_frozen: String,
    /// Sum of uncompressed file sizes.
    pub sum_size: u64,
    /// Files plus folders, root excluded.
    pub files_folders: u64,
}

impl ArchiveMetadata {
    pub fn for_table(table: &EntryTable, date_frozen: String) -> Self {
        Self {
            version: FORMAT_VERSION,
            date_frozen,
            sum_size: table.total_size(),
            files_folders: table.len() as u64,
        }
    }
}

/// `/a/b` form: absolute, no empty, `.` or `..` segments, no trailing slash.
pub fn is_canonical(path: &str) -> bool {
    match path.strip_prefix('/') {
        Some(rest) => rest.split('/').all(|s| !s.is_empty() && s != "." && s != ".."),
        None => false,
    }
}

/// Last path component. `"/a/b.txt"` gives `"b.txt"`.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Folder containing `path`, `"/"` for top-level entries.
pub fn parent_folder(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(bytes: &[u8]) -> EntryPayload {
        EntryPayload::File(FileEntry {
            data: Blob::from_vec(bytes.to_vec()),
            compressed: false,
            size: bytes.len() as u64,
            compressed_size: bytes.len() as u64,
            codec: None,
            utf8_width: 1,
        })
    }

    #[test]
    fn parent_and_basename() {
        assert_eq!(parent_folder("/a"), "/");
        assert_eq!(parent_folder("/a/b/c.txt"), "/a/b");
        assert_eq!(basename("/a/b/c.txt"), "c.txt");
        assert_eq!(basename("/a"), "a");
    }

    #[test]
    fn table_orders_folders_before_children() {
        let mut table = EntryTable::new();
        table.insert("/a/x.txt".into(), file(b"x")).unwrap();
        table.insert("/a b".into(), file(b"y")).unwrap();
        table.insert("/a".into(), EntryPayload::Folder).unwrap();
        table.insert("/a/sub".into(), EntryPayload::Folder).unwrap();
        table.insert("/a/sub/z".into(), file(b"zz")).unwrap();

        let order: Vec<&str> = table.iter().map(|e| e.path).collect();
        for (i, path) in order.iter().enumerate() {
            let parent = parent_folder(path);
            if parent != "/" {
                let p = order.iter().position(|q| *q == parent).unwrap();
                assert!(p < i, "{parent} must precede {path}");
            }
        }
        assert_eq!(table.total_size(), 4);
    }

    #[test]
    fn insert_rejects_bad_paths() {
        let mut table = EntryTable::new();
        assert!(table.insert("/".into(), EntryPayload::Folder).is_err());
        assert!(table.insert("rel".into(), EntryPayload::Folder).is_err());
        for bad in ["/../escaped.txt", "/a/../../x", "/a//b", "/a/./b", "/a/", "//"] {
            assert!(
                matches!(table.insert(bad.into(), file(b"x")), Err(crate::FrozenError::InvalidArgument(_))),
                "{bad} accepted"
            );
        }
        assert!(table.is_empty());
        table.insert("/dup".into(), EntryPayload::Folder).unwrap();
        assert!(matches!(
            table.insert("/dup".into(), EntryPayload::Folder),
            Err(crate::FrozenError::AlreadyExists(_))
        ));
        let long = format!("/{}", "n".repeat(254));
        assert!(matches!(
            table.insert(long, EntryPayload::Folder),
            Err(crate::FrozenError::PathTooLong { .. })
        ));
    }

    #[test]
    fn blob_views_share_backing() {
        let backing = Arc::new(Backing::Owned(b"hello world".to_vec()));
        let a = Blob::new(backing.clone(), 0..5);
        let b = Blob::new(backing, 6..11);
        assert_eq!(a.as_ref(), b"hello");
        assert_eq!(b.as_ref(), b"world");
    }
}
