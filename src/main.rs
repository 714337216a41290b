#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use permtemplate::cli::Args;
use permtemplate::{pipeline, TracingSink};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the `-v`/`-q` derived log filter.
const LOG_ENV: &str = "PERMTEMPLATE_LOG";

fn main() {
    let args = Args::parse().validated();
    init_tracing(&args);

    if let Err(e) = run_app(&args) {
        eprintln!("permtemplate: {e:#}");
        std::process::exit(1);
    }
}

fn run_app(args: &Args) -> Result<()> {
    let config = args.to_run_config();
    let summary = pipeline::run(&config, &TracingSink).with_context(|| {
        format!(
            "failed to generate {} from {}",
            config.output_file.display(),
            config.source_dir.display()
        )
    })?;
    tracing::debug!(
        "{} records written to {}",
        summary.records,
        summary.output_file.display()
    );
    Ok(())
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(use_ansi)
        .try_init();
}
