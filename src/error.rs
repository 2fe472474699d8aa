use std::io;
use std::path::PathBuf;

/// The primary error type for all operations in the `frozenfs` crate.
///
/// Every variant maps onto a POSIX errno through [`FrozenError::errno`], so a
/// host that signals errors by number (as a mounted filesystem must) can do so
/// without parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum FrozenError {
    /// An archive path reached the maximum filename length. Fatal at build time.
    #[error("path too long ({len} >= {max} characters): {path}")]
    PathTooLong { path: String, len: usize, max: usize },

    /// The mount target is already occupied.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// An unsupported open mode, out-of-range option or unusable file name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The path is not present in the archive.
    #[error("no such file or directory: {0}")]
    NotFound(String),

    /// A directory operation was applied to a file.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// A file operation was applied to a folder.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Mutating call on the read-only archive, or a path escaping above the root.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Malformed UTF-8 met while reading in text mode.
    #[error("unicode decode error at byte {offset}: {reason}")]
    UnicodeDecode { offset: u64, reason: String },

    /// An I/O error occurred, typically while reading or writing a real file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", path.display())]
    Io { source: io::Error, path: PathBuf },

    /// The deflate stream of a compressed entry is corrupt.
    #[error("compression codec error: {0}")]
    Codec(String),

    /// The archive image is truncated, has bad markers or inconsistent ranges.
    #[error("invalid archive image: {0}")]
    Format(String),

    /// An error during serialization or deserialization of the archive index.
    #[error("index serialization error: {0}")]
    Index(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FrozenError>;

impl FrozenError {
    /// The POSIX error number a mounting host should report for this error.
    pub fn errno(&self) -> i32 {
        match self {
            FrozenError::PathTooLong { .. } => libc::ENAMETOOLONG,
            FrozenError::AlreadyExists(_) => libc::EEXIST,
            FrozenError::InvalidArgument(_) => libc::EINVAL,
            FrozenError::NotFound(_) => libc::ENOENT,
            FrozenError::NotADirectory(_) => libc::ENOTDIR,
            FrozenError::IsADirectory(_) => libc::EISDIR,
            FrozenError::PermissionDenied(_) => libc::EPERM,
            FrozenError::UnicodeDecode { .. } => libc::EILSEQ,
            FrozenError::Io { source, .. } => source.raw_os_error().unwrap_or(libc::EIO),
            FrozenError::Codec(_) | FrozenError::Format(_) | FrozenError::Index(_) => libc::EIO,
        }
    }

    pub(crate) fn io(source: io::Error, path: impl Into<PathBuf>) -> Self {
        FrozenError::Io { source, path: path.into() }
    }
}

// Generic IO error conversion that doesn't require a path
impl From<io::Error> for FrozenError {
    fn from(err: io::Error) -> Self {
        // Errors raised by our own Read/Seek impls travel as io::Error and are
        // unwrapped here so callers still see the typed variant.
        if err.get_ref().map_or(false, |inner| inner.is::<FrozenError>()) {
            if let Some(inner) = err.into_inner() {
                if let Ok(frozen) = inner.downcast::<FrozenError>() {
                    return *frozen;
                }
            }
            return FrozenError::Codec("unrecoverable wrapped error".into());
        }
        FrozenError::Io { source: err, path: PathBuf::new() }
    }
}

impl From<FrozenError> for io::Error {
    fn from(err: FrozenError) -> Self {
        let kind = match &err {
            FrozenError::AlreadyExists(_) => io::ErrorKind::AlreadyExists,
            FrozenError::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            FrozenError::NotFound(_) => io::ErrorKind::NotFound,
            FrozenError::PermissionDenied(_) => io::ErrorKind::PermissionDenied,
            FrozenError::UnicodeDecode { .. } | FrozenError::Codec(_) | FrozenError::Format(_) => {
                io::ErrorKind::InvalidData
            }
            FrozenError::Io { source, .. } => source.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
