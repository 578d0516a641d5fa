//! Archiver Core Library
//!
//! Crawls an authenticated site through one browser tab and archives every
//! page it reaches as a landscape PDF plus an MHTML snapshot, downloading
//! binary attachments directly with the browser's session cookies.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`adapter`] - Per-site login probes, seed lists and discovery
//! - [`auth`] - Seed cookie files and the browser/HTTP cookie bridge
//! - [`browser`] - Browser tab abstraction and the Chromium implementation
//! - [`capture`] - PDF and MHTML capture of the loaded page
//! - [`crawl`] - The frontier loop and the startup sequence
//! - [`download`] - Direct HTTP downloads with manual redirect handling
//! - [`layout`] - Output path construction
//! - [`queue`] - Save requests and the depth-first frontier

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod auth;
pub mod browser;
pub mod capture;
pub mod crawl;
pub mod download;
pub mod layout;
pub mod queue;

// Re-export commonly used types
pub use adapter::{AdapterError, AdapterKind, SiteAdapter, UnknownSite};
pub use browser::{BrowserError, BrowserPage, ChromiumSession, IdleOptions, LaunchOptions};
pub use capture::{CaptureEngine, CaptureError};
pub use crawl::{CrawlError, CrawlSummary, Crawler, LoginWait, RunContext, archive_site};
pub use download::{DirectDownloader, DownloadError, DownloadOutcome, DownloadSettings};
pub use layout::{LayoutError, OutputLayout};
pub use queue::{Frontier, SaveFormat, SaveRequest};
