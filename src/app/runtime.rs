//! Settings resolution and the top-level archive run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use archiver_core::adapter::{Canvas, Confluence, Eecsis, Gradescope, WebSis};
use archiver_core::auth::{inject_seed_cookies, seed_cookie_path};
use archiver_core::browser::idle::{DEFAULT_IDLE_TIME, DEFAULT_IDLE_TIMEOUT};
use archiver_core::download::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_MAX_REDIRECTS, READ_TIMEOUT_SECS,
};
use archiver_core::{
    AdapterKind, ChromiumSession, CrawlSummary, DirectDownloader, DownloadSettings, IdleOptions,
    LaunchOptions, LoginWait, OutputLayout, RunContext, SiteAdapter, archive_site,
};
use tracing::info;

use crate::app::config::FileConfig;
use crate::cli::Args;

const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_COOKIES_DIR: &str = ".";

/// Fully resolved settings of one run.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub output_dir: PathBuf,
    pub cookies_dir: PathBuf,
    pub launch: LaunchOptions,
    pub idle: IdleOptions,
    pub login: LoginWait,
    pub download: DownloadSettings,
    pub prompt: bool,
}

impl RunSettings {
    /// Merges CLI flags over file config over built-in defaults.
    pub(crate) fn resolve(args: &Args, file: &FileConfig) -> Self {
        let launch = LaunchOptions {
            headless: args.headless || file.headless.unwrap_or(false),
            chrome_path: args.chrome_path.clone().or_else(|| file.chrome_path.clone()),
            ..LaunchOptions::default()
        };
        let idle = IdleOptions {
            concurrency: 0,
            idle_time: file
                .idle_time_ms
                .map_or(DEFAULT_IDLE_TIME, Duration::from_millis),
            timeout: file
                .idle_timeout_secs
                .map_or(DEFAULT_IDLE_TIMEOUT, Duration::from_secs),
        };
        let login = LoginWait {
            timeout: file
                .login_wait_secs
                .map_or(LoginWait::default().timeout, Duration::from_secs),
            ..LoginWait::default()
        };
        let download = DownloadSettings {
            connect_timeout_secs: file
                .download_connect_timeout_secs
                .unwrap_or(CONNECT_TIMEOUT_SECS),
            read_timeout_secs: file.download_read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
            max_redirects: file.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS),
        };

        Self {
            output_dir: args
                .output_dir
                .clone()
                .or_else(|| file.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            cookies_dir: args
                .cookies_dir
                .clone()
                .or_else(|| file.cookies_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIES_DIR)),
            launch,
            idle,
            login,
            download,
            prompt: !args.no_prompt,
        }
    }
}

/// Resolves the site argument.
pub(crate) fn resolve_site(site: Option<&str>) -> Result<AdapterKind> {
    let Some(site) = site else {
        anyhow::bail!(
            "no site given (valid sites: {})",
            AdapterKind::valid_slugs()
        );
    };
    Ok(site.parse::<AdapterKind>()?)
}

/// Archives `kind` with `settings`.
pub(crate) async fn run(kind: AdapterKind, settings: &RunSettings) -> Result<CrawlSummary> {
    match kind {
        AdapterKind::Canvas => archive_with(&Canvas::new(settings.prompt), settings).await,
        AdapterKind::Gradescope => archive_with(&Gradescope::new(), settings).await,
        AdapterKind::WebSis => archive_with(&WebSis, settings).await,
        AdapterKind::Eecsis => archive_with(&Eecsis, settings).await,
        AdapterKind::Confluence => archive_with(&Confluence, settings).await,
    }
}

async fn archive_with<A: SiteAdapter>(adapter: &A, settings: &RunSettings) -> Result<CrawlSummary> {
    let downloader = DirectDownloader::new(&settings.download)?;
    let session = ChromiumSession::launch(&settings.launch)
        .await
        .context("Failed to launch browser")?;

    let result = drive(adapter, &session, &downloader, settings).await;
    session.close().await;
    result
}

async fn drive<A: SiteAdapter>(
    adapter: &A,
    session: &ChromiumSession,
    downloader: &DirectDownloader,
    settings: &RunSettings,
) -> Result<CrawlSummary> {
    let page = session.page();
    let seed_path = seed_cookie_path(&settings.cookies_dir, adapter.slug());
    inject_seed_cookies(page, &seed_path)
        .await
        .with_context(|| format!("Failed to load seed cookies from '{}'", seed_path.display()))?;

    let layout = OutputLayout::new(&settings.output_dir, adapter.slug());
    info!(root = %layout.root().display(), "writing captures");
    let mut ctx = RunContext::new(layout, settings.idle);

    let summary = archive_site(adapter, page, downloader, &mut ctx, settings.login)
        .await
        .with_context(|| format!("Archiving {} failed", adapter.slug()))?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("args should parse")
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = RunSettings::resolve(&args(&["archiver", "canvas"]), &FileConfig::default());
        assert_eq!(settings.output_dir, PathBuf::from("output"));
        assert_eq!(settings.cookies_dir, PathBuf::from("."));
        assert!(!settings.launch.headless);
        assert_eq!(settings.launch.viewport_width, 1366);
        assert_eq!(settings.launch.viewport_height, 768);
        assert_eq!(settings.idle.timeout, Duration::from_secs(30));
        assert_eq!(settings.download.max_redirects, 10);
        assert_eq!(settings.login.timeout, Duration::from_secs(300));
        assert!(settings.prompt);
    }

    #[test]
    fn test_resolve_cli_overrides_file() {
        let file = FileConfig {
            output_dir: Some(PathBuf::from("/from/file")),
            cookies_dir: Some(PathBuf::from("/cookies/file")),
            ..FileConfig::default()
        };
        let settings = RunSettings::resolve(
            &args(&["archiver", "--output-dir", "/from/cli", "websis"]),
            &file,
        );
        assert_eq!(settings.output_dir, PathBuf::from("/from/cli"));
        assert_eq!(settings.cookies_dir, PathBuf::from("/cookies/file"));
    }

    #[test]
    fn test_resolve_file_tunables() {
        let file = FileConfig {
            headless: Some(true),
            idle_time_ms: Some(250),
            idle_timeout_secs: Some(90),
            login_wait_secs: Some(10),
            max_redirects: Some(3),
            download_read_timeout_secs: Some(60),
            ..FileConfig::default()
        };
        let settings =
            RunSettings::resolve(&args(&["archiver", "--no-prompt", "gradescope"]), &file);
        assert!(settings.launch.headless);
        assert_eq!(settings.idle.idle_time, Duration::from_millis(250));
        assert_eq!(settings.idle.timeout, Duration::from_secs(90));
        assert_eq!(settings.login.timeout, Duration::from_secs(10));
        assert_eq!(settings.download.max_redirects, 3);
        assert_eq!(settings.download.read_timeout_secs, 60);
        assert_eq!(settings.download.connect_timeout_secs, 30);
        assert!(!settings.prompt);
    }

    #[test]
    fn test_resolve_site() {
        assert_eq!(
            resolve_site(Some("eecsis")).expect("known site"),
            AdapterKind::Eecsis
        );
        let missing = resolve_site(None).expect_err("missing site");
        assert!(missing.to_string().contains("valid sites"));
        let unknown = resolve_site(Some("moodle")).expect_err("unknown site");
        assert!(unknown.to_string().contains("unknown site 'moodle'"));
    }
}
