//! Command dispatch for the `frozenfs` binary, kept in the library so the
//! integration tests and the binary share one implementation.

use std::io::{self, Write};
use std::path::Path;

use tracing::warn;

use crate::archive::{self, Archive, OnLoad};
use crate::builder::{self, BuildOptions};
use crate::cli::{self, Commands};
use crate::compress::CodecParams;
use crate::extract::{self, DeployOutcome, ExtractReport};
use crate::vfs::{MountTable, DEFAULT_DECODE_BUFFER};

/// Runs one parsed command.
pub fn run_cli_app(command: &Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Freeze { source, output, target, on_load, overwrite, compress, wbits, level, silent } => {
            let action = cli::freeze_load_action(source, output, target.as_deref(), *on_load, *overwrite, *silent)?;
            let options = BuildOptions { compress: *compress, codec: CodecParams::new(*level, *wbits)? };
            if *compress && *on_load == OnLoad::Mount {
                warn!("mounted compressed files are inflated into RAM when opened in text mode");
            }
            let built = builder::build(source, &options)?;
            archive::write_image(&built, &action, output)?;
        }
        Commands::List { archive } => {
            let archive = Archive::open(archive)?;
            let mut out = io::stdout().lock();
            for entry in archive.table().iter() {
                match entry.payload.as_file() {
                    None => writeln!(out, "{:>10}  {:<12}  {}", "-", "folder", entry.path)?,
                    Some(file) if file.compressed => {
                        let ratio = if file.size == 0 { 0.0 } else { file.compressed_size as f64 / file.size as f64 * 100.0 };
                        writeln!(out, "{:>10}  {:<12}  {}", file.size, format!("deflate {ratio:.0}%"), entry.path)?
                    }
                    Some(file) => writeln!(out, "{:>10}  {:<12}  {}", file.size, "stored", entry.path)?,
                }
            }
        }
        Commands::Info { archive } => {
            let archive = Archive::open(archive)?;
            let meta = archive.metadata();
            let action = archive.load_action();
            let mut out = io::stdout().lock();
            writeln!(out, "version:       {}", meta.version)?;
            writeln!(out, "date frozen:   {}", meta.date_frozen)?;
            writeln!(out, "entries:       {}", meta.files_folders)?;
            writeln!(out, "sum of sizes:  {}", meta.sum_size)?;
            writeln!(out, "on load:       {:?} at {}", action.on_load, action.target)?;
            writeln!(out, "overwrite:     {:?}", action.overwrite)?;
            writeln!(out, "silent:        {}", action.silent)?;
        }
        Commands::Cat { archive, path, text } => {
            let archive = Archive::open(archive)?;
            let mut mounts = MountTable::new();
            let handle = mounts.mount(archive.into_filesystem(), "/")?;
            let mut out = io::stdout().lock();
            if *text {
                let mut file = mounts.open(path, "r")?.into_text()?;
                loop {
                    let chunk = file.read(DEFAULT_DECODE_BUFFER)?;
                    if chunk.is_empty() {
                        break;
                    }
                    out.write_all(chunk.as_bytes())?;
                }
            } else {
                let mut file = mounts.open(path, "rb")?.into_binary()?;
                io::copy(&mut file, &mut out)?;
            }
            out.flush()?;
            mounts.unmount(handle)?;
        }
        Commands::Extract { archive, dest, overwrite } => {
            let archive = Archive::open(archive)?;
            let report = extract::extract(archive.table(), dest, *overwrite)?;
            print_report(dest, &report);
        }
        Commands::Deploy { archive, dest } => {
            let archive = Archive::open(archive)?;
            match extract::deploy(archive.table(), dest)? {
                DeployOutcome::Deployed(report) => print_report(dest, &report),
                DeployOutcome::AlreadyDeployed => println!("{} already deployed, nothing copied", dest.display()),
            }
        }
    }

    Ok(())
}

fn print_report(dest: &Path, report: &ExtractReport) {
    println!(
        "{} files written, {} skipped, {} folders created in {}",
        report.files_written,
        report.files_skipped,
        report.folders_created,
        dest.display()
    );
}
