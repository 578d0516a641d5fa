//! Session bridge between the browser cookie jar and direct HTTP fetches.
//!
//! Cookie selection is loose: a cookie applies to a host when
//! its domain (leading dot ignored) is a suffix or a substring of the host.
//! Path, `Secure` and expiry are not consulted. This over-shares across
//! sibling hosts such as `mit.edu.example.org`; sites in scope never hit it.

use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::{debug, info, instrument, warn};

use super::{CookieError, SessionCookie, load_seed_cookies};
use crate::browser::{BrowserError, BrowserPage};

/// Returns true if a cookie scoped to `cookie_domain` is sent to `host`.
#[must_use]
pub fn cookie_domain_matches(cookie_domain: &str, host: &str) -> bool {
    let domain = cookie_domain.trim_start_matches('.');
    if domain.is_empty() {
        return false;
    }
    host.ends_with(domain) || host.contains(domain)
}

/// Builds a `Cookie` header value from every cookie that matches `host`.
///
/// Returns `None` when no cookie matches.
#[must_use]
pub fn cookie_header_for(cookies: &[SessionCookie], host: &str) -> Option<String> {
    let pairs: Vec<String> = cookies
        .iter()
        .filter(|cookie| cookie_domain_matches(&cookie.domain, host))
        .map(|cookie| format!("{}={}", cookie.name, cookie.value()))
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// Converts the `Set-Cookie` headers of `response` into browser cookies
/// scoped to `host`.
#[must_use]
pub fn cookies_from_response(response: &reqwest::Response, host: &str) -> Vec<SessionCookie> {
    response
        .cookies()
        .map(|set_cookie| {
            let mut cookie = SessionCookie::new(set_cookie.name(), set_cookie.value(), host);
            if let Some(path) = set_cookie.path().filter(|p| !p.is_empty()) {
                cookie.path = path.to_string();
            }
            cookie.secure = set_cookie.secure();
            cookie.http_only = set_cookie.http_only();
            cookie.expires = set_cookie
                .expires()
                .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64());
            cookie
        })
        .collect()
}

/// Reads the browser jar and returns the header for `host`.
///
/// # Errors
///
/// Returns [`BrowserError`] if the jar cannot be read.
#[instrument(level = "debug", skip(page))]
pub async fn session_cookie_header(
    page: &dyn BrowserPage,
    host: &str,
) -> Result<Option<String>, BrowserError> {
    let cookies = page.cookies().await?;
    let header = cookie_header_for(&cookies, host);
    debug!(
        jar = cookies.len(),
        attached = header.is_some(),
        "selected session cookies"
    );
    Ok(header)
}

/// Pushes the response's `Set-Cookie` headers into the browser jar.
///
/// Returns the number of cookies absorbed.
///
/// # Errors
///
/// Returns [`BrowserError`] if the browser rejects the cookies.
pub async fn absorb_set_cookies(
    page: &dyn BrowserPage,
    host: &str,
    response: &reqwest::Response,
) -> Result<usize, BrowserError> {
    let cookies = cookies_from_response(response, host);
    let count = cookies.len();
    if count > 0 {
        debug!(count, host, "absorbing Set-Cookie headers");
        page.set_cookies(cookies).await?;
    }
    Ok(count)
}

/// Loads the seed file at `path` into the browser jar.
///
/// A missing file is logged and skipped. Returns the number of cookies
/// injected.
///
/// # Errors
///
/// Returns [`CookieError`] if the file is unreadable or malformed, or the
/// browser rejects the cookies.
#[instrument(skip(page, path), fields(path = %path.display()))]
pub async fn inject_seed_cookies(page: &dyn BrowserPage, path: &Path) -> Result<usize, CookieError> {
    let Some(seed) = load_seed_cookies(path)? else {
        warn!(path = %path.display(), "no seed cookie file; continuing without cookies");
        return Ok(0);
    };
    let count = seed.cookies.len();
    if count > 0 {
        page.set_cookies(seed.cookies).await?;
    }
    info!(count, "injected seed cookies");
    Ok(count)
}
