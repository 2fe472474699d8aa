use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::archive::{LoadAction, OnLoad};
use crate::compress::{MAX_LEVEL, MAX_WINDOW_BITS, MIN_WINDOW_BITS};
use crate::extract::Overwrite;
use crate::{FrozenError, Result};

/// Extension every image written by `freeze` must carry.
pub const IMAGE_EXTENSION: &str = "frz";

#[derive(Parser, Debug)]
#[command(author, version, about = "Freeze directory trees into read-only archive images", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Freeze a directory tree into a `.frz` image.
    #[command(alias = "f")]
    Freeze {
        /// Directory whose contents go into the image.
        #[arg(required = true)]
        source: PathBuf,

        /// Path of the image to write (must end in .frz).
        #[arg(required = true)]
        output: PathBuf,

        /// Mount point or extraction directory used when the image is activated. [default: /<source dir name>]
        #[arg(short, long)]
        target: Option<String>,

        /// What activating the image does.
        #[arg(short, long, value_enum, default_value_t = OnLoad::Mount)]
        on_load: OnLoad,

        /// On extract, whether files already present at the target get replaced.
        #[arg(long, value_enum, default_value_t = Overwrite::Never)]
        overwrite: Overwrite,

        /// Compress files whose compressed form is smaller.
        #[arg(short, long)]
        compress: bool,

        /// Compression window is 2^wbits bytes.
        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(MIN_WINDOW_BITS as i64..=MAX_WINDOW_BITS as i64))]
        wbits: u8,

        /// Compression level (0-9).
        #[arg(short, long, default_value_t = 9, value_parser = clap::value_parser!(u32).range(0..=MAX_LEVEL as i64))]
        level: u32,

        /// Log only errors, and store the silent flag in the image.
        #[arg(short, long)]
        silent: bool,
    },

    /// List the entries of an image.
    #[command(alias = "l")]
    List {
        #[arg(required = true)]
        archive: PathBuf,
    },

    /// Show the metadata and on-load action of an image.
    Info {
        #[arg(required = true)]
        archive: PathBuf,
    },

    /// Mount an image and write one of its files to stdout.
    Cat {
        #[arg(required = true)]
        archive: PathBuf,

        /// Absolute path inside the image.
        #[arg(required = true)]
        path: String,

        /// Decode as UTF-8 text instead of copying raw bytes.
        #[arg(long)]
        text: bool,
    },

    /// Copy the contents of an image into a directory.
    #[command(alias = "x")]
    Extract {
        #[arg(required = true)]
        archive: PathBuf,

        /// Destination directory, created if missing.
        #[arg(required = true)]
        dest: PathBuf,

        #[arg(long, value_enum, default_value_t = Overwrite::Never)]
        overwrite: Overwrite,
    },

    /// Copy the contents of an image into a directory unless it already has content.
    Deploy {
        #[arg(required = true)]
        archive: PathBuf,

        #[arg(required = true)]
        dest: PathBuf,
    },
}

impl Commands {
    /// Whether log output should be limited to errors.
    pub fn is_silent(&self) -> bool {
        matches!(self, Commands::Freeze { silent: true, .. })
    }
}

/// Checks the `freeze` arguments and derives the load action to store.
pub fn freeze_load_action(
    source: &Path,
    output: &Path,
    target: Option<&str>,
    on_load: OnLoad,
    overwrite: Overwrite,
    silent: bool,
) -> Result<LoadAction> {
    let is_image = output
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION));
    if !is_image {
        return Err(FrozenError::InvalidArgument(format!(
            "output {} must have the .{IMAGE_EXTENSION} extension",
            output.display()
        )));
    }
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or_default();

    let target = match target {
        Some(t) => t.to_string(),
        None => {
            let name = source
                .canonicalize()
                .map_err(|e| FrozenError::io(e, source))?
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| FrozenError::InvalidArgument(format!("cannot name a target after {}", source.display())))?;
            format!("/{name}")
        }
    };
    if crate::common::basename(&target) == stem {
        return Err(FrozenError::InvalidArgument(format!(
            "target {target} must differ from the image name {stem}"
        )));
    }

    let action = LoadAction { target, on_load, overwrite, silent };
    action.validate()?;
    Ok(action)
}

/// Parses command-line arguments using `clap` and returns the command to execute.
pub fn run() -> Result<Commands> {
    let args = Args::parse();
    Ok(args.command)
}
