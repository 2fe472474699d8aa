//! Main entry point for the frozenfs CLI app

use frozenfs::cli;
use frozenfs::cli_runner::run_cli_app;
use tracing_subscriber::EnvFilter;

fn main() -> std::process::ExitCode {
    if let Err(e) = run_app() {
        if e.downcast_ref::<clap::Error>().is_none() {
            eprintln!("Error: {}", e);
        }
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

fn run_app() -> Result<(), Box<dyn std::error::Error>> {
    let command = cli::run()?;
    init_logging(command.is_silent());
    run_cli_app(&command)
}

/// Logs go to stderr so listings and `cat` output stay clean on stdout.
fn init_logging(silent: bool) {
    let filter = if silent {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}
