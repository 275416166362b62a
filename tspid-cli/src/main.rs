use std::io::{self, Write};

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

mod cli;
mod config;
mod error;
mod report;
mod scan;

use cli::CliArgs;
use config::ProgramConfig;
use error::{AppError, Result};

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Application failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    init_logging(args.verbose, args.quiet)?;

    let config = ProgramConfig::try_from(&args)?;
    info!(
        input = %config.input,
        batch_size = config.batch_size,
        strict = config.strict,
        format = %config.format,
        "Scanning transport stream"
    );

    let source = config.input.open()?;
    let report = scan::scan(source, config.batch_size, config.strict)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report.write_to(&mut out, config.format)?;
    out.flush()?;
    Ok(())
}

/// Logs go to stderr, stdout carries the report
fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .with(filter)
        .try_init()
        .map_err(|e| AppError::Initialization(e.to_string()))
}
