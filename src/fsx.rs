//! Small filesystem helpers for the extractor.
//!
//! Re-exports `std::fs` so call-sites can import `crate::fsx as fs` and use
//! both the std functions and the helpers below.

use std::io;
use std::path::Path;

pub use std::fs::*;

/// Creates `path` if missing. `Ok(true)` when it was created, `Ok(false)`
/// when it already existed; any other failure is returned.
pub fn ensure_dir(path: &Path) -> io::Result<bool> {
    match std::fs::create_dir(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

/// Creates `path` and every missing ancestor, one level at a time so each
/// creation can be reported. Returns the directories that were created.
pub fn ensure_dir_all(path: &Path) -> io::Result<Vec<std::path::PathBuf>> {
    let mut created = Vec::new();
    let mut partial = std::path::PathBuf::new();
    for component in path.components() {
        partial.push(component);
        if partial.parent().is_none() {
            // Root or prefix: never created here.
            continue;
        }
        if ensure_dir(&partial)? {
            created.push(partial.clone());
        }
    }
    Ok(created)
}

/// True when `path` is a directory with at least one entry.
pub fn is_populated_dir(path: &Path) -> bool {
    std::fs::read_dir(path).map(|mut it| it.next().is_some()).unwrap_or(false)
}
