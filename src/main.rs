//! CLI entry point for the archiver tool.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

mod app;
mod cli;

use app::config::load_default_file_config;
use app::runtime::{RunSettings, resolve_site, run};
use app::terminal::{default_log_level, init_tracing};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let file_config = load_default_file_config()?;
    init_tracing(default_log_level(
        args.verbose,
        args.quiet,
        file_config.verbosity,
    ));
    debug!(?args, "CLI arguments parsed");

    // Unknown sites fail before a browser is launched.
    let kind = resolve_site(args.site.as_deref())?;
    let settings = RunSettings::resolve(&args, &file_config);
    debug!(?settings, "settings resolved");

    info!(site = %kind, "archiver starting");
    let summary = run(kind, &settings).await?;
    info!(
        processed = summary.processed(),
        archived = summary.archived,
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        discovered = summary.discovered,
        "archive complete"
    );
    Ok(())
}
