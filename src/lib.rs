//! # FrozenFS Core Library
//!
//! Freezes a directory tree into an immutable, optionally compressed archive
//! image and serves it back either as a read-only mounted filesystem or by
//! copying it out to real storage.
//!
//! ## Key Modules
//!
//! - [`builder`]: Scans a source tree into an ordered entry table.
//! - [`compress`]: Zlib/deflate codec with a configurable small window.
//! - [`archive`]: Writes and loads the `.frz` image format.
//! - [`vfs`]: The read-only filesystem, its streams and the mount table.
//! - [`extract`]: Extraction and one-time deployment onto real storage.
//!
//! ## Examples
//!
//! ```no_run
//! use frozenfs::archive::Archive;
//! use frozenfs::vfs::MountTable;
//!
//! let archive = Archive::open(std::path::Path::new("assets.frz"))?;
//! let mut mounts = MountTable::new();
//! let _handle = mounts.mount(archive.into_filesystem(), "/assets")?;
//! let text = mounts.open("/assets/readme.txt", "r")?.into_text()?.read_to_string()?;
//! println!("{text}");
//! # Ok::<(), frozenfs::FrozenError>(())
//! ```

pub mod archive;
pub mod builder;
pub mod cli;
pub mod cli_runner;
pub mod common;
pub mod compress;
pub mod error;
pub mod extract;
pub mod vfs;

// Filesystem helpers over std::fs
pub mod fsx;

pub use error::{FrozenError, Result};
