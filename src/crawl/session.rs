//! Startup sequence of a run: initial page, login wait, seed list, crawl.

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use super::{CrawlError, CrawlSummary, Crawler, RunContext};
use crate::adapter::SiteAdapter;
use crate::browser::BrowserPage;
use crate::download::DirectDownloader;

/// Default time the operator gets to log in by hand.
pub const DEFAULT_LOGIN_WAIT: Duration = Duration::from_secs(300);

/// Default interval between login probes.
pub const DEFAULT_LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How long to wait for a manual login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginWait {
    /// Give up after this long.
    pub timeout: Duration,
    /// Probe interval.
    pub poll_interval: Duration,
}

impl Default for LoginWait {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOGIN_WAIT,
            poll_interval: DEFAULT_LOGIN_POLL_INTERVAL,
        }
    }
}

/// Archives one site end to end on an already launched tab.
///
/// Opens the adapter's initial page, waits for the session to be logged in,
/// builds the seed list and runs the crawl.
///
/// # Errors
///
/// Returns [`CrawlError::NotLoggedIn`] if the login probe never passes, or
/// the first error of any later step.
#[instrument(skip_all, fields(site = adapter.slug()))]
pub async fn archive_site<A: SiteAdapter>(
    adapter: &A,
    page: &dyn BrowserPage,
    downloader: &DirectDownloader,
    ctx: &mut RunContext,
    login: LoginWait,
) -> Result<CrawlSummary, CrawlError> {
    let initial_url = adapter.initial_url();
    info!(url = initial_url, "opening initial page");
    page.goto(initial_url).await?;
    page.wait_for_network_idle(ctx.idle_options()).await?;

    wait_for_login(adapter, page, login).await?;

    let seed = adapter.build_initial_list(page, ctx).await?;
    info!(items = seed.len(), "seed list ready");
    Crawler::new(adapter, page, downloader).run(seed, ctx).await
}

async fn wait_for_login<A: SiteAdapter>(
    adapter: &A,
    page: &dyn BrowserPage,
    login: LoginWait,
) -> Result<(), CrawlError> {
    if adapter.is_logged_in(page).await? {
        info!("session is logged in");
        return Ok(());
    }

    warn!(
        timeout_secs = login.timeout.as_secs(),
        "not logged in; log in through the browser window"
    );
    let started = Instant::now();
    loop {
        let elapsed = started.elapsed();
        if elapsed >= login.timeout {
            return Err(CrawlError::NotLoggedIn {
                slug: adapter.slug(),
                waited: login.timeout,
            });
        }
        tokio::time::sleep(login.poll_interval.min(login.timeout - elapsed)).await;
        if adapter.is_logged_in(page).await? {
            info!(waited_secs = started.elapsed().as_secs(), "login detected");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_wait_defaults() {
        let wait = LoginWait::default();
        assert_eq!(wait.timeout, Duration::from_secs(300));
        assert_eq!(wait.poll_interval, Duration::from_secs(5));
    }
}
