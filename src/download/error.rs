//! Error types for the download module.
//!
//! Every variant carries the URL (or path) it failed on so a fatal download
//! error reads on its own at the top of the run's error chain.

use std::path::PathBuf;

use thiserror::Error;

use crate::browser::BrowserError;

/// Errors that can occur during a direct download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// File system error while writing the artifact.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The URL is malformed or has no host to scope cookies to.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The site redirected to its login page mid-download.
    #[error("session expired: {url} redirected to login at {location}")]
    SessionExpired {
        /// URL that issued the redirect.
        url: String,
        /// The login location.
        location: String,
    },

    /// A 302 response carried no `Location` header.
    #[error("redirect from {url} has no Location header")]
    MissingRedirectTarget {
        /// URL that issued the redirect.
        url: String,
    },

    /// Any status other than 200, 302 or 500.
    #[error("unexpected HTTP {status} downloading {url}")]
    UnexpectedStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The redirect chain exceeded the configured bound.
    #[error("too many redirects ({limit}) starting at {url}")]
    TooManyRedirects {
        /// The first URL of the chain.
        url: String,
        /// Configured maximum.
        limit: usize,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Reading or writing the browser cookie jar failed.
    #[error("cookie bridge failed for {url}: {source}")]
    Browser {
        /// URL being downloaded.
        url: String,
        /// Underlying browser error.
        #[source]
        source: BrowserError,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, classifying timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an unexpected status error.
    pub fn unexpected_status(url: impl Into<String>, status: u16) -> Self {
        Self::UnexpectedStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a cookie bridge error.
    pub fn browser(url: impl Into<String>, source: BrowserError) -> Self {
        Self::Browser {
            url: url.into(),
            source,
        }
    }

    /// Returns true if re-running after logging in again is the fix.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}
