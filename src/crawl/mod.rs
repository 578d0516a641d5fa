//! Crawl driver: walks the frontier, capturing or downloading each item and
//! splicing discovered children in depth-first.
//!
//! # Architecture
//!
//! - [`RunContext`] - Output layout plus the background-activity counter
//! - [`Crawler`] - The per-item loop over a [`Frontier`](crate::queue::Frontier)
//! - [`archive_site`] - Startup sequence: initial page, login wait, seed, crawl
//!
//! Every step is awaited before the next one starts. The first error aborts
//! the run; the only soft failure is a download that answered HTTP 500.

mod driver;
mod session;

pub use driver::{CrawlSummary, Crawler};
pub use session::{DEFAULT_LOGIN_POLL_INTERVAL, DEFAULT_LOGIN_WAIT, LoginWait, archive_site};

use std::time::Duration;

use thiserror::Error;

use crate::adapter::AdapterError;
use crate::browser::{BrowserError, IdleOptions};
use crate::capture::CaptureError;
use crate::download::DownloadError;
use crate::layout::{LayoutError, OutputLayout};

/// State threaded through the driver and every adapter hook.
#[derive(Debug, Clone)]
pub struct RunContext {
    layout: OutputLayout,
    idle: IdleOptions,
    background_activity: usize,
}

impl RunContext {
    /// Creates a context with no background activity.
    #[must_use]
    pub fn new(layout: OutputLayout, idle: IdleOptions) -> Self {
        Self {
            layout,
            idle,
            background_activity: 0,
        }
    }

    /// Returns the site's output layout.
    #[must_use]
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Records that the current page left a long-lived request behind.
    ///
    /// Each call lets one more in-flight request count as idle for the rest
    /// of the run.
    pub fn note_background_activity(&mut self) {
        self.background_activity += 1;
    }

    /// Number of background pollers noted so far.
    #[must_use]
    pub fn background_activity(&self) -> usize {
        self.background_activity
    }

    /// Idle-wait parameters with the current concurrency tolerance.
    #[must_use]
    pub fn idle_options(&self) -> IdleOptions {
        self.idle.with_concurrency(self.background_activity)
    }
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Loading or settling an item's page failed.
    #[error("failed to load '{title}': {source}")]
    Navigation {
        /// Title of the item.
        title: String,
        /// Underlying browser error.
        #[source]
        source: BrowserError,
    },

    /// Capturing an item failed.
    #[error("failed to capture '{title}': {source}")]
    Capture {
        /// Title of the item.
        title: String,
        /// Underlying capture error.
        #[source]
        source: CaptureError,
    },

    /// Downloading an item failed.
    #[error("failed to download '{title}': {source}")]
    Download {
        /// Title of the item.
        title: String,
        /// Underlying download error.
        #[source]
        source: DownloadError,
    },

    /// An adapter hook failed on an item.
    #[error("{stage} failed for '{title}': {source}")]
    Adapter {
        /// Hook name (`pre-capture`, `discovery`).
        stage: &'static str,
        /// Title of the item.
        title: String,
        /// Underlying adapter error.
        #[source]
        source: AdapterError,
    },

    /// An item's title does not map to a path under the site root.
    #[error("cannot place '{title}': {source}")]
    Layout {
        /// Title of the item.
        title: String,
        /// Underlying layout error.
        #[source]
        source: LayoutError,
    },

    /// The operator never completed the login.
    #[error("not logged in to {slug} after waiting {waited:?}")]
    NotLoggedIn {
        /// Adapter slug.
        slug: &'static str,
        /// How long the run waited.
        waited: Duration,
    },

    /// Startup adapter step failed (login probe, seed list).
    #[error(transparent)]
    Startup(#[from] AdapterError),

    /// Startup browser step failed (initial navigation, idle wait).
    #[error(transparent)]
    Browser(#[from] BrowserError),
}
