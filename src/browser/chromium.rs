//! chromiumoxide-backed browser session.
//!
//! Launches one Chromium instance, opens a single tab and keeps a background
//! task per CDP network event stream so idle waits can see in-flight
//! requests that started before the wait began.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetEmulatedMediaParams;
use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookieParam, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
    SetCookiesParams, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::storage::GetCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureSnapshotFormat, CaptureSnapshotParams, PrintToPdfParams,
};
use chromiumoxide::handler::viewport::Viewport;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::idle::{IdleOptions, InflightTracker};
use super::{BrowserError, BrowserPage, PdfOptions};
use crate::auth::SessionCookie;

/// Default viewport width in pixels.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1366;

/// Default viewport height in pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 768;

/// Poll interval of the idle wait loop.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Browser launch configuration.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a window. Headed by default so the operator can log in.
    pub headless: bool,
    /// Chrome/Chromium executable (None for auto-detection).
    pub chrome_path: Option<PathBuf>,
    /// Viewport width in pixels.
    pub viewport_width: u32,
    /// Viewport height in pixels.
    pub viewport_height: u32,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_path: None,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

/// A launched browser plus the one tab the crawl drives.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: ChromiumPage,
}

impl ChromiumSession {
    /// Launches Chromium and opens a blank tab.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Launch`] when the config is invalid, the
    /// executable cannot be started, or the first tab cannot be opened.
    #[instrument(level = "debug")]
    pub async fn launch(options: &LaunchOptions) -> Result<Self, BrowserError> {
        let viewport = Viewport {
            width: options.viewport_width,
            height: options.viewport_height,
            ..Viewport::default()
        };
        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport_width, options.viewport_height)
            .viewport(viewport);
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        let page = ChromiumPage::attach(page).await?;

        info!(headless = options.headless, "browser launched");
        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    /// Returns the driven tab.
    #[must_use]
    pub fn page(&self) -> &ChromiumPage {
        &self.page
    }

    /// Closes the browser and waits for the process to exit.
    pub async fn close(mut self) {
        self.page.stop_listeners();
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "browser wait failed");
        }
        self.handler.abort();
        info!("browser closed");
    }
}

/// The single Chromium tab, with live in-flight request tracking.
pub struct ChromiumPage {
    page: Page,
    tracker: Arc<Mutex<InflightTracker>>,
    listeners: Vec<JoinHandle<()>>,
}

impl ChromiumPage {
    /// Wraps `page` and subscribes to its network events.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Command`] when an event stream cannot be opened.
    pub async fn attach(page: Page) -> Result<Self, BrowserError> {
        let tracker = Arc::new(Mutex::new(InflightTracker::default()));
        let mut listeners = Vec::with_capacity(3);

        let mut started = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| BrowserError::command("network.requestWillBeSent", e))?;
        let started_tracker = Arc::clone(&tracker);
        listeners.push(tokio::spawn(async move {
            while let Some(event) = started.next().await {
                lock(&started_tracker).request_started(event.request_id.inner().clone(), Instant::now());
            }
        }));

        let mut finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(|e| BrowserError::command("network.loadingFinished", e))?;
        let finished_tracker = Arc::clone(&tracker);
        listeners.push(tokio::spawn(async move {
            while let Some(event) = finished.next().await {
                lock(&finished_tracker).request_finished(event.request_id.inner(), Instant::now());
            }
        }));

        let mut failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(|e| BrowserError::command("network.loadingFailed", e))?;
        let failed_tracker = Arc::clone(&tracker);
        listeners.push(tokio::spawn(async move {
            while let Some(event) = failed.next().await {
                lock(&failed_tracker).request_finished(event.request_id.inner(), Instant::now());
            }
        }));

        Ok(Self {
            page,
            tracker,
            listeners,
        })
    }

    fn stop_listeners(&mut self) {
        for listener in self.listeners.drain(..) {
            listener.abort();
        }
    }
}

fn lock(tracker: &Mutex<InflightTracker>) -> std::sync::MutexGuard<'_, InflightTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    #[instrument(skip(self))]
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        // Requests of the outgoing document are not waited on.
        lock(&self.tracker).reset(Instant::now());
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::navigation(url, e))?;
        Ok(())
    }

    async fn reload(&self) -> Result<(), BrowserError> {
        lock(&self.tracker).reset(Instant::now());
        self.page
            .reload()
            .await
            .map_err(|e| BrowserError::command("reload", e))?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn wait_for_network_idle(&self, options: IdleOptions) -> Result<(), BrowserError> {
        let started = Instant::now();
        loop {
            let now = Instant::now();
            let (idle, in_flight) = {
                let tracker = lock(&self.tracker);
                (
                    tracker.is_idle(now, options.concurrency, options.idle_time),
                    tracker.in_flight(),
                )
            };
            if idle {
                debug!(
                    in_flight,
                    waited_ms = started.elapsed().as_millis(),
                    "network idle"
                );
                return Ok(());
            }
            if now.duration_since(started) >= options.timeout {
                return Err(BrowserError::IdleTimeout {
                    timeout: options.timeout,
                    in_flight,
                });
            }
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    async fn title(&self) -> Result<String, BrowserError> {
        let title = self
            .page
            .get_title()
            .await
            .map_err(|e| BrowserError::command("title", e))?;
        Ok(title.unwrap_or_default())
    }

    async fn url(&self) -> Result<String, BrowserError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| BrowserError::command("url", e))?;
        Ok(url.unwrap_or_default())
    }

    async fn evaluate_json(&self, expression: &str) -> Result<Value, BrowserError> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| BrowserError::command("evaluate", e))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn emulate_media(&self, media: &str) -> Result<(), BrowserError> {
        self.page
            .execute(SetEmulatedMediaParams::builder().media(media).build())
            .await
            .map_err(|e| BrowserError::command("emulateMedia", e))?;
        Ok(())
    }

    async fn print_pdf(&self, options: PdfOptions) -> Result<Vec<u8>, BrowserError> {
        let params = PrintToPdfParams::builder()
            .landscape(options.landscape)
            .print_background(options.print_background)
            .build();
        self.page
            .pdf(params)
            .await
            .map_err(|e| BrowserError::command("pdf", e))
    }

    async fn snapshot_mhtml(&self) -> Result<String, BrowserError> {
        let params = CaptureSnapshotParams::builder()
            .format(CaptureSnapshotFormat::Mhtml)
            .build();
        let snapshot = self
            .page
            .execute(params)
            .await
            .map_err(|e| BrowserError::command("captureSnapshot", e))?;
        Ok(snapshot.result.data.clone())
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>, BrowserError> {
        // Storage.getCookies reads the whole profile jar, not just the
        // cookies visible to the tab's current URL.
        let response = self
            .page
            .execute(GetCookiesParams::default())
            .await
            .map_err(|e| BrowserError::command("getAllCookies", e))?;
        Ok(response
            .result
            .cookies
            .iter()
            .map(session_cookie)
            .collect())
    }

    async fn set_cookies(&self, cookies: Vec<SessionCookie>) -> Result<(), BrowserError> {
        let params = cookies
            .iter()
            .map(cookie_param)
            .collect::<Result<Vec<_>, _>>()?;
        if params.is_empty() {
            return Ok(());
        }
        self.page
            .execute(SetCookiesParams::new(params))
            .await
            .map_err(|e| BrowserError::command("setCookies", e))?;
        Ok(())
    }

    async fn user_agent(&self) -> Result<String, BrowserError> {
        let value = self.evaluate_json("navigator.userAgent").await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Script(format!("expected user agent string, got {value}")))
    }
}

fn session_cookie(c: &Cookie) -> SessionCookie {
    let mut cookie = SessionCookie::new(c.name.clone(), c.value.clone(), c.domain.clone());
    cookie.path = c.path.clone();
    cookie.secure = c.secure;
    cookie.http_only = c.http_only;
    cookie.expires = (!c.session && c.expires > 0.0).then_some(c.expires);
    cookie
}

/// Builds a domain-scoped CDP cookie. No `url` is set, so the cookie lands
/// on its own domain whatever document the tab currently shows.
fn cookie_param(cookie: &SessionCookie) -> Result<CookieParam, BrowserError> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value().to_string())
        .domain(cookie.domain.clone())
        .path(cookie.path.clone())
        .secure(cookie.secure)
        .http_only(cookie.http_only);
    if let Some(expires) = cookie.expires {
        builder = builder.expires(TimeSinceEpoch::new(expires));
    }
    builder
        .build()
        .map_err(|e| BrowserError::command("setCookies", e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_param_is_scoped_by_domain_not_tab_url() {
        let mut cookie = SessionCookie::new("sid", "abc123", ".gradescope.com");
        cookie.path = "/courses".to_string();
        cookie.secure = true;
        cookie.http_only = true;

        let param = cookie_param(&cookie).unwrap();

        assert!(param.url.is_none());
        assert_eq!(param.name, "sid");
        assert_eq!(param.value, "abc123");
        assert_eq!(param.domain.as_deref(), Some(".gradescope.com"));
        assert_eq!(param.path.as_deref(), Some("/courses"));
        assert_eq!(param.secure, Some(true));
        assert_eq!(param.http_only, Some(true));
        assert!(param.expires.is_none());
    }

    #[test]
    fn test_cookie_param_keeps_expiry() {
        let mut cookie = SessionCookie::new("remember", "1", "canvas.mit.edu");
        cookie.expires = Some(1_900_000_000.0);

        let param = cookie_param(&cookie).unwrap();

        assert_eq!(param.expires.map(|t| *t.inner()), Some(1_900_000_000.0));
    }
}
