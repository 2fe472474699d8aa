//! # Mounted View
//!
//! [`FrozenFs`] answers filesystem queries directly against an
//! [`EntryTable`], without copying any payload. It implements the
//! [`Filesystem`] trait, which is what a [`MountTable`] dispatches to.

mod mount;
mod path;
mod stream;

pub use mount::{MountHandle, MountTable};
pub use path::resolve;
pub use stream::{BinaryFile, TextFile, DEFAULT_DECODE_BUFFER, MIN_DECODE_BUFFER};

use tracing::debug;

use crate::common::{basename, parent_folder, ArchiveMetadata, EntryPayload, EntryTable, MAX_FILENAME_LEN};
use crate::{FrozenError, Result};

/// Type bits of a folder in `st_mode`.
pub const S_IFDIR: u32 = 0x4000;
/// Type bits of a regular file in `st_mode`.
pub const S_IFREG: u32 = 0x8000;
/// `f_flag` bit for a read-only mount.
pub const ST_RDONLY: u64 = 1;

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Text,
    Binary,
}

impl OpenMode {
    /// Accepts `r`, `rt`, `tr`, `rb` and `br`.
    ///
    /// Anything asking for write access is refused with `PermissionDenied`,
    /// any other mode string with `InvalidArgument`.
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "r" | "rt" | "tr" => Ok(OpenMode::Text),
            "rb" | "br" => Ok(OpenMode::Binary),
            m if m.contains(['w', 'a', 'x', '+']) => {
                Err(FrozenError::PermissionDenied(format!("mode {m:?}: read-only filesystem")))
            }
            m => Err(FrozenError::InvalidArgument(format!("unsupported open mode {m:?}"))),
        }
    }
}

/// An opened file.
pub enum OpenFile {
    Binary(BinaryFile),
    Text(TextFile),
}

impl OpenFile {
    pub fn mode(&self) -> OpenMode {
        match self {
            OpenFile::Binary(_) => OpenMode::Binary,
            OpenFile::Text(_) => OpenMode::Text,
        }
    }

    pub fn into_binary(self) -> Result<BinaryFile> {
        match self {
            OpenFile::Binary(f) => Ok(f),
            OpenFile::Text(_) => Err(FrozenError::InvalidArgument("file was opened in text mode".into())),
        }
    }

    pub fn into_text(self) -> Result<TextFile> {
        match self {
            OpenFile::Text(f) => Ok(f),
            OpenFile::Binary(_) => Err(FrozenError::InvalidArgument("file was opened in binary mode".into())),
        }
    }

    pub fn tell(&self) -> u64 {
        match self {
            OpenFile::Binary(f) => f.tell(),
            OpenFile::Text(f) => f.tell(),
        }
    }

    /// Raw bytes into `buf` regardless of mode.
    pub fn readinto(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            OpenFile::Binary(f) => f.readinto(buf),
            OpenFile::Text(f) => f.readinto(buf),
        }
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    /// [`S_IFDIR`] or [`S_IFREG`].
    pub kind: u32,
    pub inode: u64,
    pub size: u64,
}

impl DirEntryInfo {
    pub fn is_dir(&self) -> bool {
        self.kind == S_IFDIR
    }
}

/// POSIX-like `stat` result. Only the type bits and the size are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub mode: u32,
    pub size: u64,
}

impl Stat {
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFDIR != 0
    }

    /// `(mode, ino, dev, nlink, uid, gid, size, atime, mtime, ctime)`.
    pub fn to_tuple(&self) -> [u64; 10] {
        [u64::from(self.mode), 0, 0, 0, 0, 0, self.size, 0, 0, 0]
    }
}

/// Aggregate counters returned by `statvfs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatVfs {
    pub block_size: u64,
    pub fragment_size: u64,
    pub blocks: u64,
    pub blocks_free: u64,
    pub blocks_available: u64,
    pub files: u64,
    pub files_free: u64,
    pub files_available: u64,
    pub flags: u64,
    pub name_max: u64,
}

impl StatVfs {
    pub fn to_tuple(&self) -> [u64; 10] {
        [
            self.block_size,
            self.fragment_size,
            self.blocks,
            self.blocks_free,
            self.blocks_available,
            self.files,
            self.files_free,
            self.files_available,
            self.flags,
            self.name_max,
        ]
    }
}

/// The operations a mountable filesystem provides.
///
/// Paths are interpreted relative to the filesystem's own root; the mount
/// table strips the mount point before dispatching.
pub trait Filesystem {
    /// Called when the filesystem is registered.
    fn mount(&mut self, readonly: bool) -> Result<()>;
    /// Called when the filesystem is deregistered.
    fn umount(&mut self);
    fn open(&self, path: &str, mode: &str) -> Result<OpenFile>;
    fn ilistdir(&self, path: &str) -> Result<Vec<DirEntryInfo>>;
    fn stat(&self, path: &str) -> Result<Stat>;
    fn statvfs(&self) -> StatVfs;
    fn chdir(&mut self, path: &str) -> Result<()>;
    fn getcwd(&self) -> String;
    fn remove(&mut self, path: &str) -> Result<()>;
    fn mkdir(&mut self, path: &str) -> Result<()>;
    fn rmdir(&mut self, path: &str) -> Result<()>;
    fn rename(&mut self, from: &str, to: &str) -> Result<()>;

    fn listdir(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.ilistdir(path)?.into_iter().map(|e| e.name).collect())
    }
}

/// Read-only filesystem over one entry table.
pub struct FrozenFs {
    table: EntryTable,
    sum_size: u64,
    files_folders: u64,
    cwd: String,
    decode_buffer: usize,
}

impl FrozenFs {
    pub fn new(table: EntryTable, metadata: &ArchiveMetadata) -> Self {
        Self {
            table,
            sum_size: metadata.sum_size,
            files_folders: metadata.files_folders,
            cwd: "/".to_string(),
            decode_buffer: DEFAULT_DECODE_BUFFER,
        }
    }

    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    /// Scratch buffer size for text streams opened afterwards.
    /// Values below [`MIN_DECODE_BUFFER`] are ignored.
    pub fn set_decode_buffer_size(&mut self, n: usize) {
        if n >= MIN_DECODE_BUFFER {
            self.decode_buffer = n;
        }
    }

    /// Convenience for `open(path, "rb")`.
    pub fn open_binary(&self, path: &str) -> Result<BinaryFile> {
        self.open(path, "rb")?.into_binary()
    }

    /// Convenience for `open(path, "r")`.
    pub fn open_text(&self, path: &str) -> Result<TextFile> {
        self.open(path, "r")?.into_text()
    }

    /// Resolves `path` and looks it up; `None` means the root.
    fn lookup(&self, path: &str) -> Result<(String, Option<&EntryPayload>)> {
        let resolved = resolve(&self.cwd, path)?;
        if resolved == "/" {
            return Ok((resolved, None));
        }
        match self.table.get(&resolved) {
            Some(payload) => Ok((resolved, Some(payload))),
            None => Err(FrozenError::NotFound(resolved)),
        }
    }
}

impl Filesystem for FrozenFs {
    fn mount(&mut self, _readonly: bool) -> Result<()> {
        self.cwd = "/".to_string();
        Ok(())
    }

    fn umount(&mut self) {}

    fn open(&self, path: &str, mode: &str) -> Result<OpenFile> {
        let mode = OpenMode::parse(mode)?;
        let (resolved, payload) = self.lookup(path)?;
        let entry = match payload {
            None => return Err(FrozenError::PermissionDenied(resolved)),
            Some(EntryPayload::Folder) => return Err(FrozenError::IsADirectory(resolved)),
            Some(EntryPayload::File(entry)) => entry,
        };
        debug!(path = %resolved, ?mode, compressed = entry.compressed, "open");
        Ok(match mode {
            OpenMode::Binary => OpenFile::Binary(BinaryFile::open(entry)),
            OpenMode::Text => OpenFile::Text(TextFile::open(entry, self.decode_buffer)?),
        })
    }

    fn ilistdir(&self, path: &str) -> Result<Vec<DirEntryInfo>> {
        let (folder, payload) = self.lookup(path)?;
        if let Some(EntryPayload::File(_)) = payload {
            return Err(FrozenError::NotADirectory(folder));
        }
        Ok(self
            .table
            .iter()
            .filter(|e| parent_folder(e.path) == folder)
            .map(|e| DirEntryInfo {
                name: basename(e.path).to_string(),
                kind: if e.payload.is_folder() { S_IFDIR } else { S_IFREG },
                inode: 0,
                size: e.payload.size(),
            })
            .collect())
    }

    fn stat(&self, path: &str) -> Result<Stat> {
        let (_, payload) = self.lookup(path)?;
        Ok(match payload {
            None | Some(EntryPayload::Folder) => Stat { mode: S_IFDIR, size: 0 },
            Some(EntryPayload::File(f)) => Stat { mode: S_IFREG, size: f.size },
        })
    }

    fn statvfs(&self) -> StatVfs {
        StatVfs {
            block_size: 1,
            fragment_size: 1,
            blocks: self.sum_size,
            blocks_free: 0,
            blocks_available: 0,
            files: self.files_folders,
            files_free: 0,
            files_available: 0,
            flags: ST_RDONLY,
            name_max: MAX_FILENAME_LEN as u64,
        }
    }

    fn chdir(&mut self, path: &str) -> Result<()> {
        let (resolved, payload) = self.lookup(path)?;
        if let Some(EntryPayload::File(_)) = payload {
            return Err(FrozenError::NotADirectory(resolved));
        }
        self.cwd = resolved;
        Ok(())
    }

    fn getcwd(&self) -> String {
        self.cwd.clone()
    }

    fn remove(&mut self, path: &str) -> Result<()> {
        Err(FrozenError::PermissionDenied(format!("remove {path}: read-only filesystem")))
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        Err(FrozenError::PermissionDenied(format!("mkdir {path}: read-only filesystem")))
    }

    fn rmdir(&mut self, path: &str) -> Result<()> {
        Err(FrozenError::PermissionDenied(format!("rmdir {path}: read-only filesystem")))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        Err(FrozenError::PermissionDenied(format!("rename {from} -> {to}: read-only filesystem")))
    }
}
