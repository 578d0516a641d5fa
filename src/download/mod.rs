//! Direct HTTP downloads for binary artifacts.
//!
//! Used for `Download` items only: the browser never renders the file, the
//! body is streamed straight to the item's destination.
//!
//! # Example
//!
//! ```no_run
//! use archiver_core::browser::BrowserPage;
//! use archiver_core::download::{DirectDownloader, DownloadSettings};
//! use std::path::Path;
//!
//! # async fn example(page: &dyn BrowserPage) -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = DirectDownloader::new(&DownloadSettings::default())?;
//! let outcome = downloader
//!     .download(page, "https://gradescope.com/files/1.pdf", Path::new("out/file.pdf"))
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;

pub use client::{DirectDownloader, DownloadOutcome, DownloadSettings};
pub use error::DownloadError;
