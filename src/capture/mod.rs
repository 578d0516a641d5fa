//! Page capture: landscape PDF plus MHTML snapshot of the loaded document.
//!
//! Both artifacts are written unconditionally; re-running a site overwrites
//! earlier captures.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::browser::{BrowserError, BrowserPage, PdfOptions};
use crate::layout::{PDF_EXTENSION, SNAPSHOT_EXTENSION, artifact_path};

/// CSS media type emulated before printing.
pub const CAPTURE_MEDIA: &str = "screen";

/// Errors raised while capturing a page.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The browser failed to render or snapshot the page.
    #[error("failed to capture {path}: {source}")]
    Browser {
        /// Artifact base path.
        path: PathBuf,
        /// Underlying browser error.
        #[source]
        source: BrowserError,
    },

    /// Writing an artifact failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The artifact path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl CaptureError {
    fn browser(path: &Path, source: BrowserError) -> Self {
        Self::Browser {
            path: path.to_path_buf(),
            source,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Paths and sizes of one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPage {
    /// The PDF rendering.
    pub pdf_path: PathBuf,
    /// The MHTML snapshot.
    pub snapshot_path: PathBuf,
    /// PDF size in bytes.
    pub pdf_bytes: usize,
    /// Snapshot size in bytes.
    pub snapshot_bytes: usize,
}

/// Renders the current page of a tab to disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureEngine {
    pdf: PdfOptions,
}

impl CaptureEngine {
    /// Creates an engine with the given print settings.
    #[must_use]
    pub fn new(pdf: PdfOptions) -> Self {
        Self { pdf }
    }

    /// Captures the page currently loaded in `page` to `<base>.pdf` and
    /// `<base>.mhtml`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if rendering, snapshotting or writing fails.
    #[instrument(skip(self, page, base), fields(base = %base.display()))]
    pub async fn capture(
        &self,
        page: &dyn BrowserPage,
        base: &Path,
    ) -> Result<CapturedPage, CaptureError> {
        if let Some(parent) = base.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CaptureError::io(parent, e))?;
        }

        page.emulate_media(CAPTURE_MEDIA)
            .await
            .map_err(|e| CaptureError::browser(base, e))?;

        let pdf_path = artifact_path(base, PDF_EXTENSION);
        let pdf = page
            .print_pdf(self.pdf)
            .await
            .map_err(|e| CaptureError::browser(base, e))?;
        tokio::fs::write(&pdf_path, &pdf)
            .await
            .map_err(|e| CaptureError::io(&pdf_path, e))?;
        debug!(path = %pdf_path.display(), bytes = pdf.len(), "wrote pdf");

        let snapshot_path = artifact_path(base, SNAPSHOT_EXTENSION);
        let snapshot = page
            .snapshot_mhtml()
            .await
            .map_err(|e| CaptureError::browser(base, e))?;
        tokio::fs::write(&snapshot_path, snapshot.as_bytes())
            .await
            .map_err(|e| CaptureError::io(&snapshot_path, e))?;

        info!(path = %base.display(), "captured page");
        Ok(CapturedPage {
            pdf_path,
            snapshot_path,
            pdf_bytes: pdf.len(),
            snapshot_bytes: snapshot.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_prints_landscape_with_backgrounds() {
        let engine = CaptureEngine::default();
        assert!(engine.pdf.landscape);
        assert!(engine.pdf.print_background);
    }

    #[test]
    fn test_capture_error_display_names_path() {
        let err = CaptureError::io(
            Path::new("out/canvas/Homepage.pdf"),
            std::io::Error::other("disk full"),
        );
        assert!(err.to_string().contains("out/canvas/Homepage.pdf"));
    }
}
