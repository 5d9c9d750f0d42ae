//! Command-line entry point for zipscan.

use anyhow::{Context, Result};
use clap::Parser;

use zipscan::Cli;

/// Parse arguments, set up logging, and run the scan.
///
/// Missing arguments make clap print usage and exit before any file is
/// touched. A fatal scan error is returned so the process exits non-zero.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_target(false)
        .init();

    let config = cli.to_config().context("failed to resolve paths")?;
    let summary = zipscan::run(&config).await?;
    log::info!("{summary}");

    Ok(())
}
