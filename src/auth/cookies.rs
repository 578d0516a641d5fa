//! Session cookie model and seed-file loading.
//!
//! Seed files are JSON exports of a browser cookie jar: either a bare array
//! of cookie records or `{ "cookies": [...] }`. Both the DevTools field names
//! (`expires`, `httpOnly`, `session`) and the extension-export names
//! (`expirationDate`, `hostOnly`, `host`) are accepted.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// A single browser cookie.
///
/// The value field is redacted in Debug output so cookie contents never end
/// up in logs.
#[derive(Clone, PartialEq)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive, never log).
    value: String,
    /// Domain the cookie is scoped to (leading dot means subdomains match).
    pub domain: String,
    /// URL path scope.
    pub path: String,
    /// Only sent over HTTPS.
    pub secure: bool,
    /// Hidden from page scripts.
    pub http_only: bool,
    /// Expiry as Unix seconds (`None` = session cookie).
    pub expires: Option<f64>,
}

impl SessionCookie {
    /// Creates a session cookie with path `/` and no flags.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            secure: false,
            http_only: false,
            expires: None,
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if the cookie expired at or before `now` (Unix seconds).
    #[must_use]
    pub fn is_expired_at(&self, now: f64) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("expires", &self.expires)
            .finish()
    }
}

/// Errors that can occur while loading a cookie seed file.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// The seed file could not be read.
    #[error("failed to read cookie file {path}: {source}")]
    Io {
        /// Seed file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The seed file is not a JSON cookie export.
    #[error("invalid cookie JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The browser rejected the seed cookies.
    #[error("failed to inject seed cookies: {0}")]
    Browser(#[from] crate::browser::BrowserError),
}

/// Returns `<cookies_dir>/cookies-<slug>.json`.
#[must_use]
pub fn seed_cookie_path(cookies_dir: &Path, slug: &str) -> PathBuf {
    cookies_dir.join(format!("cookies-{slug}.json"))
}

/// Cookies parsed from a seed file plus per-entry warnings.
#[derive(Debug, Default)]
pub struct SeedCookies {
    /// Usable cookies.
    pub cookies: Vec<SessionCookie>,
    /// Entries that were skipped and why.
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeedPayload {
    Array(Vec<SeedEntry>),
    Wrapped { cookies: Vec<SeedEntry> },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedEntry {
    name: Option<String>,
    value: Option<String>,
    domain: Option<String>,
    host: Option<String>,
    path: Option<String>,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    http_only: bool,
    host_only: Option<bool>,
    session: Option<bool>,
    expires: Option<f64>,
    expiration_date: Option<f64>,
}

/// Parses a JSON cookie export.
///
/// Malformed or expired entries are skipped and reported in
/// [`SeedCookies::warnings`]; only a document that is not a cookie array at
/// all is an error.
///
/// # Errors
///
/// Returns [`CookieError::Json`] when the input is not a cookie export.
#[instrument(level = "debug", skip(input))]
pub fn parse_seed_cookies(input: &str) -> Result<SeedCookies, CookieError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(SeedCookies::default());
    }
    let payload: SeedPayload = serde_json::from_str(trimmed)?;
    let entries = match payload {
        SeedPayload::Array(entries) => entries,
        SeedPayload::Wrapped { cookies } => cookies,
    };

    let now = unix_now();
    let mut seed = SeedCookies::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match convert_entry(entry) {
            Ok(cookie) if cookie.is_expired_at(now) => seed.warnings.push(format!(
                "entry {}: cookie '{}' for '{}' has expired",
                index + 1,
                cookie.name,
                cookie.domain
            )),
            Ok(cookie) => seed.cookies.push(cookie),
            Err(reason) => seed.warnings.push(format!("entry {}: {reason}", index + 1)),
        }
    }
    debug!(
        cookies = seed.cookies.len(),
        skipped = seed.warnings.len(),
        "parsed seed cookies"
    );
    Ok(seed)
}

/// Loads the seed file at `path`.
///
/// Returns `Ok(None)` when the file does not exist; a missing seed only means
/// the operator has to log in by hand.
///
/// # Errors
///
/// Returns [`CookieError`] when the file exists but cannot be read or parsed.
#[instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn load_seed_cookies(path: &Path) -> Result<Option<SeedCookies>, CookieError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CookieError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };
    let seed = parse_seed_cookies(&content)?;
    for warning in &seed.warnings {
        warn!(path = %path.display(), "{warning}");
    }
    Ok(Some(seed))
}

fn convert_entry(entry: SeedEntry) -> Result<SessionCookie, String> {
    let name = entry.name.unwrap_or_default();
    if name.trim().is_empty() {
        return Err("missing required field: name".to_string());
    }
    let mut domain = entry
        .domain
        .or(entry.host)
        .unwrap_or_default()
        .trim()
        .to_string();
    for scheme in ["https://", "http://"] {
        if let Some(stripped) = domain.strip_prefix(scheme) {
            domain = stripped.to_string();
        }
    }
    if let Some((host, _)) = domain.split_once('/') {
        domain = host.to_string();
    }
    if domain.is_empty() {
        return Err(format!("cookie '{name}' has no domain"));
    }
    if entry.host_only == Some(false) && !domain.starts_with('.') {
        domain = format!(".{domain}");
    }

    let path = entry
        .path
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "/".to_string());
    let expires = if entry.session == Some(true) {
        None
    } else {
        entry
            .expires
            .or(entry.expiration_date)
            .filter(|e| *e > 0.0)
    };

    Ok(SessionCookie {
        name,
        value: entry.value.unwrap_or_default(),
        domain,
        path,
        secure: entry.secure,
        http_only: entry.http_only,
        expires,
    })
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |duration| duration.as_secs_f64())
}
