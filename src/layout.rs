//! Output path construction for captured artifacts.
//!
//! Every site writes under `<output_dir>/<slug>/`. A request title is a
//! `/`-separated relative path below that root; archive artifacts append
//! `.pdf` / `.mhtml` to it, downloads use it verbatim. Every segment must be
//! a real name, so each title maps to its own path inside the root.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extension of the rendered PDF artifact.
pub const PDF_EXTENSION: &str = "pdf";

/// Extension of the MHTML snapshot artifact.
pub const SNAPSHOT_EXTENSION: &str = "mhtml";

/// Errors raised while resolving a title to a path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The title has no usable path below the site root.
    #[error("invalid output title '{title}': empty, '.' and '..' segments are not allowed")]
    InvalidTitle {
        /// The rejected title.
        title: String,
    },
}

/// Slug-scoped output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Creates the layout for `slug` under `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl AsRef<Path>, slug: &str) -> Self {
        Self {
            root: output_dir.as_ref().join(slug),
        }
    }

    /// Returns the slug-scoped root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a request title to its destination path (without artifact extension).
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidTitle`] when the title is empty or has an
    /// empty, `.` or `..` segment. Such a title would resolve outside its own
    /// directory or onto a sibling's path.
    pub fn destination(&self, title: &str) -> Result<PathBuf, LayoutError> {
        let mut path = self.root.clone();
        for segment in title.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(LayoutError::InvalidTitle {
                    title: title.to_string(),
                });
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Path of the PDF rendering for an archive title.
    ///
    /// # Errors
    ///
    /// See [`OutputLayout::destination`].
    pub fn pdf_path(&self, title: &str) -> Result<PathBuf, LayoutError> {
        Ok(artifact_path(&self.destination(title)?, PDF_EXTENSION))
    }

    /// Path of the MHTML snapshot for an archive title.
    ///
    /// # Errors
    ///
    /// See [`OutputLayout::destination`].
    pub fn snapshot_path(&self, title: &str) -> Result<PathBuf, LayoutError> {
        Ok(artifact_path(&self.destination(title)?, SNAPSHOT_EXTENSION))
    }

    /// Returns true if the archive for `title` already has its PDF on disk.
    /// An invalid title is never archived.
    #[must_use]
    pub fn is_archived(&self, title: &str) -> bool {
        self.pdf_path(title).is_ok_and(|path| path.exists())
    }
}

/// Appends `.ext` to `base` without replacing any existing dotted suffix.
///
/// Titles such as `6.006/Homepage` or `Spring 2.0` must keep their dots,
/// which rules out `Path::with_extension`.
#[must_use]
pub fn artifact_path(base: &Path, extension: &str) -> PathBuf {
    let mut raw: OsString = base.as_os_str().to_owned();
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_joins_slug_and_title() {
        let layout = OutputLayout::new("output", "canvas");
        assert_eq!(
            layout.destination("6.006-2020FA-123/Homepage").unwrap(),
            PathBuf::from("output/canvas/6.006-2020FA-123/Homepage")
        );
    }

    #[test]
    fn test_archive_artifacts_append_extensions() {
        let layout = OutputLayout::new("output", "websis");
        assert_eq!(
            layout.pdf_path("Homepage").unwrap(),
            PathBuf::from("output/websis/Homepage.pdf")
        );
        assert_eq!(
            layout.snapshot_path("Homepage").unwrap(),
            PathBuf::from("output/websis/Homepage.mhtml")
        );
    }

    #[test]
    fn test_artifact_path_keeps_dots_in_title() {
        let base = Path::new("out/Spring 2.0");
        assert_eq!(artifact_path(base, "pdf"), PathBuf::from("out/Spring 2.0.pdf"));
    }

    #[test]
    fn test_destination_is_deterministic() {
        let layout = OutputLayout::new("/tmp/out", "gradescope");
        let title = "CS 101-42/assignments/HW 1/main";
        assert_eq!(
            layout.destination(title).unwrap(),
            layout.destination(title).unwrap()
        );
        assert!(layout.destination(title).unwrap().starts_with(layout.root()));
    }

    #[test]
    fn test_empty_title_is_rejected_instead_of_escaping_root() {
        let layout = OutputLayout::new("output", "gradescope");
        assert_eq!(
            layout.pdf_path(""),
            Err(LayoutError::InvalidTitle {
                title: String::new()
            })
        );
    }

    #[test]
    fn test_empty_segment_is_rejected_instead_of_collapsing() {
        let layout = OutputLayout::new("output", "gradescope");
        assert!(layout.destination("CS-1/assignments//main").is_err());
        assert!(layout.destination("/leading").is_err());
        assert!(layout.destination("trailing/").is_err());
    }

    #[test]
    fn test_traversal_segments_are_rejected() {
        let layout = OutputLayout::new("output", "eecsis");
        assert!(layout.destination("../../etc/passwd").is_err());
        assert!(layout.destination("a/./b").is_err());
        assert!(layout.destination("..").is_err());
    }

    #[test]
    fn test_is_archived_checks_pdf() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path(), "canvas");
        assert!(!layout.is_archived("Homepage"));
        std::fs::create_dir_all(layout.root()).unwrap();
        std::fs::write(layout.pdf_path("Homepage").unwrap(), b"%PDF").unwrap();
        assert!(layout.is_archived("Homepage"));
        assert!(!layout.is_archived(""));
    }
}
