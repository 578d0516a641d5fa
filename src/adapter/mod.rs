//! Site adapters: per-site login probes, seed lists and discovery.
//!
//! # Architecture
//!
//! - [`SiteAdapter`] - Async trait each site implements, with its own metadata enum
//! - [`AdapterKind`] - Slug lookup over the built-in adapters
//! - [`Canvas`], [`Gradescope`], [`WebSis`], [`Eecsis`], [`Confluence`] - built-in sites
//!
//! Page scripts only collect raw data and return it as JSON. Every decision
//! about what to queue, and every "this page is not what we expected"
//! failure, is made on the Rust side.

mod canvas;
mod confluence;
mod eecsis;
mod gradescope;
mod prompt;
mod websis;

pub use canvas::{Canvas, CanvasMeta, term_short_name};
pub use confluence::Confluence;
pub use eecsis::Eecsis;
pub use gradescope::{ASSIGNMENT_DELAY_MS, Gradescope, GradescopeMeta};
pub use prompt::wait_for_enter;
pub use websis::WebSis;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::browser::{BrowserError, BrowserPage};
use crate::crawl::RunContext;
use crate::queue::SaveRequest;

/// Errors raised by site adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The page did not look the way discovery expects.
    #[error("{adapter}: assumption violated: {reason}")]
    AssumptionViolated {
        /// Adapter slug.
        adapter: &'static str,
        /// What was expected and not found.
        reason: String,
    },

    /// A page script returned data of the wrong shape.
    #[error("{adapter}: unexpected page script result: {source}")]
    Decode {
        /// Adapter slug.
        adapter: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Reading the operator's confirmation failed.
    #[error("failed to read operator confirmation: {0}")]
    Prompt(#[source] std::io::Error),

    /// Driving the browser failed.
    #[error(transparent)]
    Browser(#[from] BrowserError),
}

impl AdapterError {
    /// Creates an assumption violation.
    pub fn violated(adapter: &'static str, reason: impl Into<String>) -> Self {
        Self::AssumptionViolated {
            adapter,
            reason: reason.into(),
        }
    }
}

/// Trait that all site adapters implement.
///
/// `Meta` is the adapter's own sum type describing what kind of page a
/// request points at; discovery matches on it exhaustively.
///
/// # Object Safety
///
/// This trait uses `async_trait` so the hooks can take `&dyn BrowserPage`.
/// The associated type keeps it out of `dyn` itself; [`AdapterKind`]
/// dispatches into the generic crawl driver instead.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Per-request metadata carried from discovery to discovery.
    type Meta: Clone + fmt::Debug + Send + Sync;

    /// Short identifier; also the output subdirectory.
    fn slug(&self) -> &'static str;

    /// First page to load.
    fn initial_url(&self) -> &'static str;

    /// Returns true if the loaded page shows a logged-in session.
    async fn is_logged_in(&self, page: &dyn BrowserPage) -> Result<bool, AdapterError>;

    /// Builds the seed list from the logged-in initial page.
    async fn build_initial_list(
        &self,
        page: &dyn BrowserPage,
        ctx: &mut RunContext,
    ) -> Result<Vec<SaveRequest<Self::Meta>>, AdapterError>;

    /// Runs after the page settled and before it is captured.
    async fn pre_capture(
        &self,
        _page: &dyn BrowserPage,
        _item: &SaveRequest<Self::Meta>,
        _ctx: &mut RunContext,
    ) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Returns the requests found on the captured page of `item`.
    async fn discover_more_requests(
        &self,
        page: &dyn BrowserPage,
        item: &SaveRequest<Self::Meta>,
        ctx: &mut RunContext,
    ) -> Result<Vec<SaveRequest<Self::Meta>>, AdapterError>;
}

/// Evaluates `script` and decodes its JSON result as `T`.
///
/// # Errors
///
/// Returns [`AdapterError::Browser`] if evaluation fails and
/// [`AdapterError::Decode`] if the value has the wrong shape.
pub async fn evaluate_as<T: DeserializeOwned>(
    page: &dyn BrowserPage,
    adapter: &'static str,
    script: &str,
) -> Result<T, AdapterError> {
    let value = page.evaluate_json(script).await?;
    serde_json::from_value(value).map_err(|source| AdapterError::Decode { adapter, source })
}

/// Turns scraped text into a single path segment.
///
/// # Errors
///
/// Returns [`AdapterError::AssumptionViolated`] when nothing usable is left
/// after trimming (empty, `.` or `..`).
pub fn path_segment(adapter: &'static str, text: &str) -> Result<String, AdapterError> {
    let segment = text.trim().replace('/', "-");
    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(AdapterError::violated(
            adapter,
            format!("scraped name {text:?} is not usable as a path segment"),
        ));
    }
    Ok(segment)
}

/// Built-in adapters, selectable by slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// MIT Canvas LMS.
    Canvas,
    /// Gradescope.
    Gradescope,
    /// MIT student records (WebSIS).
    WebSis,
    /// MIT EECS department information system.
    Eecsis,
    /// MIT Confluence wiki.
    Confluence,
}

impl AdapterKind {
    /// Every built-in adapter, in help-text order.
    pub const ALL: [Self; 5] = [
        Self::Canvas,
        Self::Gradescope,
        Self::WebSis,
        Self::Eecsis,
        Self::Confluence,
    ];

    /// Returns the slug for this adapter.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Canvas => "canvas",
            Self::Gradescope => "gradescope",
            Self::WebSis => "websis",
            Self::Eecsis => "eecsis",
            Self::Confluence => "confluence",
        }
    }

    /// Looks up an adapter by slug.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    /// Comma-separated list of valid slugs.
    #[must_use]
    pub fn valid_slugs() -> String {
        Self::ALL.map(Self::slug).join(", ")
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error for an unrecognized slug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown site '{slug}' (valid sites: {valid})")]
pub struct UnknownSite {
    /// The rejected slug.
    pub slug: String,
    /// Comma-separated valid slugs.
    pub valid: String,
}

impl FromStr for AdapterKind {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slug(s.trim()).ok_or_else(|| UnknownSite {
            slug: s.to_string(),
            valid: Self::valid_slugs(),
        })
    }
}
