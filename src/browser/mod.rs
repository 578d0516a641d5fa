//! Browser tab abstraction used by the crawl driver, capture engine,
//! cookie bridge and site adapters.
//!
//! # Architecture
//!
//! - [`BrowserPage`] - Async trait over the single tab a run drives
//! - [`ChromiumSession`] - chromiumoxide-backed implementation
//! - [`InflightTracker`] - network-idle bookkeeping fed by CDP network events
//!
//! Everything above this module talks to `&dyn BrowserPage`, so tests can
//! substitute a scripted page without a Chromium binary.

mod chromium;
mod error;
pub mod idle;

pub use chromium::{ChromiumPage, ChromiumSession, LaunchOptions};
pub use error::BrowserError;
pub use idle::{IdleOptions, InflightTracker};

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::SessionCookie;

/// Print settings for the PDF rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfOptions {
    /// Landscape orientation.
    pub landscape: bool,
    /// Include CSS backgrounds.
    pub print_background: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            landscape: true,
            print_background: true,
        }
    }
}

/// The one browser tab a run drives.
///
/// # Object Safety
///
/// This trait uses `async_trait` so that adapters and the driver can take
/// `&dyn BrowserPage`.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigates to `url` and waits for the load event.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Reloads the current document.
    async fn reload(&self) -> Result<(), BrowserError>;

    /// Waits until the page is network-idle per `options`.
    async fn wait_for_network_idle(&self, options: IdleOptions) -> Result<(), BrowserError>;

    /// Returns the document title.
    async fn title(&self) -> Result<String, BrowserError>;

    /// Returns the current document URL.
    async fn url(&self) -> Result<String, BrowserError>;

    /// Evaluates a JavaScript expression and returns its JSON value.
    ///
    /// `undefined` and `null` both come back as [`Value::Null`].
    async fn evaluate_json(&self, expression: &str) -> Result<Value, BrowserError>;

    /// Switches CSS media emulation (`screen`, `print`).
    async fn emulate_media(&self, media: &str) -> Result<(), BrowserError>;

    /// Prints the current document to PDF bytes.
    async fn print_pdf(&self, options: PdfOptions) -> Result<Vec<u8>, BrowserError>;

    /// Captures a single-file MHTML snapshot of the current document.
    async fn snapshot_mhtml(&self) -> Result<String, BrowserError>;

    /// Returns every cookie in the browser's jar, whatever URL the tab shows.
    async fn cookies(&self) -> Result<Vec<SessionCookie>, BrowserError>;

    /// Adds or replaces cookies in the browser's jar. Each cookie is scoped
    /// by its own domain, so this works on a blank tab.
    async fn set_cookies(&self, cookies: Vec<SessionCookie>) -> Result<(), BrowserError>;

    /// Returns the browser's user agent string.
    async fn user_agent(&self) -> Result<String, BrowserError>;

    /// Returns true if `selector` matches at least one element.
    async fn selector_exists(&self, selector: &str) -> Result<bool, BrowserError> {
        let literal = serde_json::to_string(selector)
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        let found = self
            .evaluate_json(&format!("document.querySelector({literal}) !== null"))
            .await?;
        found
            .as_bool()
            .ok_or_else(|| BrowserError::Script(format!("expected boolean, got {found}")))
    }
}
