//! Constants for the download module (timeouts, redirect bound).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default bound on followed redirects per download.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Location substring that marks a redirect to the site's login page.
pub const LOGIN_PATH_MARKER: &str = "/login";
