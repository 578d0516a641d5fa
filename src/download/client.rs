//! Direct HTTP downloader that borrows the browser's session.
//!
//! Redirects are followed by hand so that every hop re-reads the browser's
//! cookies for the hop's host and pushes `Set-Cookie` headers back into the
//! browser before moving on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{COOKIE, LOCATION, USER_AGENT};
use reqwest::{Client, redirect};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_MAX_REDIRECTS, LOGIN_PATH_MARKER, READ_TIMEOUT_SECS,
};
use super::error::DownloadError;
use crate::auth::{absorb_set_cookies, session_cookie_header};
use crate::browser::BrowserPage;

/// Tunables of the direct downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSettings {
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
    /// Redirects followed before giving up.
    pub max_redirects: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// What a download produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The body was written to `path`.
    Saved {
        /// Destination file.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// The server answered with a soft failure; nothing was written.
    Skipped {
        /// The HTTP status that caused the skip.
        status: u16,
    },
}

impl DownloadOutcome {
    /// Returns true if a file was written.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// HTTP client for out-of-band artifact downloads.
///
/// Certificate validation and automatic redirects are both disabled: the
/// sites in scope sit behind institutional proxies, and redirect handling
/// has to see every hop.
#[derive(Debug, Clone)]
pub struct DirectDownloader {
    client: Client,
    max_redirects: usize,
}

impl DirectDownloader {
    /// Creates a downloader.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn new(settings: &DownloadSettings) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.read_timeout_secs))
            .gzip(true)
            .danger_accept_invalid_certs(true)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(DownloadError::ClientBuild)?;
        Ok(Self {
            client,
            max_redirects: settings.max_redirects,
        })
    }

    /// Downloads `url` to `destination` using the browser's session.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::SessionExpired`] on a redirect to the login page
    /// - [`DownloadError::MissingRedirectTarget`] on a 302 without `Location`
    /// - [`DownloadError::TooManyRedirects`] past the configured bound
    /// - [`DownloadError::UnexpectedStatus`] for statuses other than 200/302/500
    /// - network, IO and cookie-bridge failures
    #[instrument(skip(self, page, destination), fields(destination = %destination.display()))]
    pub async fn download(
        &self,
        page: &dyn BrowserPage,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadOutcome, DownloadError> {
        let mut current = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let user_agent = page
            .user_agent()
            .await
            .map_err(|e| DownloadError::browser(url, e))?;

        for hop in 0..=self.max_redirects {
            let host = current
                .host_str()
                .ok_or_else(|| DownloadError::invalid_url(current.as_str()))?
                .to_string();

            let cookie_header = session_cookie_header(page, &host)
                .await
                .map_err(|e| DownloadError::browser(current.as_str(), e))?;
            let mut request = self
                .client
                .get(current.clone())
                .header(USER_AGENT, user_agent.as_str());
            if let Some(cookie_header) = cookie_header {
                request = request.header(COOKIE, cookie_header);
            }

            let response = request
                .send()
                .await
                .map_err(|e| DownloadError::network(current.as_str(), e))?;
            absorb_set_cookies(page, &host, &response)
                .await
                .map_err(|e| DownloadError::browser(current.as_str(), e))?;

            match response.status().as_u16() {
                302 => {
                    let location = response
                        .headers()
                        .get(LOCATION)
                        .and_then(|value| value.to_str().ok())
                        .filter(|value| !value.is_empty())
                        .ok_or_else(|| DownloadError::MissingRedirectTarget {
                            url: current.to_string(),
                        })?;
                    if location.contains(LOGIN_PATH_MARKER) {
                        return Err(DownloadError::SessionExpired {
                            url: current.to_string(),
                            location: location.to_string(),
                        });
                    }
                    let next = current
                        .join(location)
                        .map_err(|_| DownloadError::invalid_url(location))?;
                    debug!(hop, from = %current, to = %next, "following redirect");
                    current = next;
                }
                500 => {
                    warn!(url = %current, "server error, nothing to download");
                    return Ok(DownloadOutcome::Skipped { status: 500 });
                }
                200 => {
                    let bytes = save_body(response, current.as_str(), destination).await?;
                    info!(path = %destination.display(), bytes, "download complete");
                    return Ok(DownloadOutcome::Saved {
                        path: destination.to_path_buf(),
                        bytes,
                    });
                }
                status => return Err(DownloadError::unexpected_status(current.as_str(), status)),
            }
        }

        Err(DownloadError::TooManyRedirects {
            url: url.to_string(),
            limit: self.max_redirects,
        })
    }
}

/// Writes the response body to `destination`, removing the partial file if
/// the stream fails.
async fn save_body(
    response: reqwest::Response,
    url: &str,
    destination: &Path,
) -> Result<u64, DownloadError> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::io(parent, e))?;
    }
    let mut file = File::create(destination)
        .await
        .map_err(|e| DownloadError::io(destination, e))?;

    let result = stream_to_file(&mut file, response, url, destination).await;
    if result.is_err() {
        debug!(path = %destination.display(), "cleaning up partial file after error");
        let _ = tokio::fs::remove_file(destination).await;
    }
    result
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
