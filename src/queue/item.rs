//! Save request types and format definitions.

use std::fmt;

/// How a queued item is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// Rendered in the browser and saved as PDF + MHTML snapshot.
    Archive,
    /// Fetched out-of-band over HTTP and written byte-for-byte.
    Download,
}

impl SaveFormat {
    /// Returns the stable string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single unit of work in the frontier.
///
/// `M` is the adapter-defined metadata enum that tells the adapter's next
/// discovery step what kind of page it is looking at. Requests are never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest<M> {
    /// Target address. Empty means "capture the page that is already loaded".
    pub url: String,
    /// Output path relative to the site's output root.
    ///
    /// Archive titles carry no extension (`.pdf`/`.mhtml` are appended);
    /// download titles carry their own.
    pub title: String,
    /// Capture strategy.
    pub format: SaveFormat,
    /// Adapter context for the next discovery step.
    pub meta: M,
    /// Fixed wait in milliseconds used instead of the network-idle signal.
    pub use_delay_wait: Option<u64>,
}

impl<M> SaveRequest<M> {
    /// Creates an archive request.
    pub fn archive(url: impl Into<String>, title: impl Into<String>, meta: M) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            format: SaveFormat::Archive,
            meta,
            use_delay_wait: None,
        }
    }

    /// Creates a download request.
    pub fn download(url: impl Into<String>, title: impl Into<String>, meta: M) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            format: SaveFormat::Download,
            meta,
            use_delay_wait: None,
        }
    }

    /// Replaces the network-idle wait with a flat delay.
    #[must_use]
    pub fn with_delay_wait(mut self, millis: u64) -> Self {
        self.use_delay_wait = Some(millis);
        self
    }

    /// Returns true when the item captures the already loaded page.
    #[must_use]
    pub fn uses_current_page(&self) -> bool {
        self.url.is_empty()
    }
}
