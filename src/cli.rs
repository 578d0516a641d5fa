//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Archive an authenticated website to PDF and MHTML.
///
/// Opens the site in a browser, waits for you to be logged in, then walks
/// the site's pages and writes each one under `<output-dir>/<site>/`.
#[derive(Parser, Debug)]
#[command(name = "archiver")]
#[command(author, version, about)]
pub struct Args {
    /// Site to archive (canvas, gradescope, websis, eecsis, confluence)
    #[arg(value_name = "SITE")]
    pub site: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Root directory for captured sites [default: output]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory holding cookies-<site>.json seed files [default: .]
    #[arg(long, value_name = "DIR")]
    pub cookies_dir: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Chrome/Chromium executable to launch
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Skip interactive confirmations
    #[arg(long)]
    pub no_prompt: bool,
}
