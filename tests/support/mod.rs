//! Shared test doubles for integration tests.
//!
//! [`FakePage`] stands in for a Chromium tab: it records navigations and idle
//! waits, keeps an in-memory cookie jar, and answers `evaluate_json` from a
//! queue of scripted values.
//!
//! By default `cookies()` returns the whole jar, as Network.getAllCookies
//! does. [`FakePage::with_tab_scoped_cookies`] switches it to returning only
//! cookies visible to the tab's current URL, as Page.getCookies does.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use archiver_core::auth::SessionCookie;
use archiver_core::browser::{BrowserError, BrowserPage, IdleOptions, PdfOptions};
use async_trait::async_trait;
use serde_json::Value;

/// PDF bytes every capture produces.
pub const FAKE_PDF: &[u8] = b"%PDF-1.4 fake";

/// MHTML text every snapshot produces.
pub const FAKE_MHTML: &str = "MIME-Version: 1.0\r\n\r\nfake snapshot";

/// User agent the fake browser reports.
pub const FAKE_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) FakeChrome/120.0";

/// Scripted in-memory browser tab.
#[derive(Debug, Default)]
pub struct FakePage {
    navigations: Mutex<Vec<String>>,
    reloads: Mutex<usize>,
    idle_waits: Mutex<Vec<usize>>,
    cookies: Mutex<Vec<SessionCookie>>,
    scripts: Mutex<VecDeque<Value>>,
    titles: Mutex<VecDeque<String>>,
    url: Mutex<String>,
    tab_scoped_cookies: bool,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title returned by every `title` call.
    pub fn with_title(self, title: &str) -> Self {
        self.push_title(title);
        self
    }

    /// Sets the current document URL.
    pub fn with_url(self, url: &str) -> Self {
        *self.url.lock().expect("url lock") = url.to_string();
        self
    }

    /// Limits `cookies()` to the cookies whose domain covers the tab's host.
    pub fn with_tab_scoped_cookies(mut self) -> Self {
        self.tab_scoped_cookies = true;
        self
    }

    /// Queues a title. The last queued title sticks once the queue drains.
    pub fn push_title(&self, title: &str) {
        self.titles
            .lock()
            .expect("titles lock")
            .push_back(title.to_string());
    }

    /// Queues the value of the next `evaluate_json` call.
    pub fn push_script_result(&self, value: Value) {
        self.scripts.lock().expect("scripts lock").push_back(value);
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().expect("navigations lock").clone()
    }

    pub fn reloads(&self) -> usize {
        *self.reloads.lock().expect("reloads lock")
    }

    /// Concurrency tolerance passed to each idle wait, in call order.
    pub fn idle_waits(&self) -> Vec<usize> {
        self.idle_waits.lock().expect("idle lock").clone()
    }

    pub fn jar(&self) -> Vec<SessionCookie> {
        self.cookies.lock().expect("cookies lock").clone()
    }

    pub fn pending_scripts(&self) -> usize {
        self.scripts.lock().expect("scripts lock").len()
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.navigations
            .lock()
            .expect("navigations lock")
            .push(url.to_string());
        *self.url.lock().expect("url lock") = url.to_string();
        Ok(())
    }

    async fn reload(&self) -> Result<(), BrowserError> {
        *self.reloads.lock().expect("reloads lock") += 1;
        Ok(())
    }

    async fn wait_for_network_idle(&self, options: IdleOptions) -> Result<(), BrowserError> {
        self.idle_waits
            .lock()
            .expect("idle lock")
            .push(options.concurrency);
        Ok(())
    }

    async fn title(&self) -> Result<String, BrowserError> {
        let mut titles = self.titles.lock().expect("titles lock");
        let title = if titles.len() > 1 {
            titles.pop_front().unwrap_or_default()
        } else {
            titles.front().cloned().unwrap_or_default()
        };
        Ok(title)
    }

    async fn url(&self) -> Result<String, BrowserError> {
        Ok(self.url.lock().expect("url lock").clone())
    }

    async fn evaluate_json(&self, _expression: &str) -> Result<Value, BrowserError> {
        Ok(self
            .scripts
            .lock()
            .expect("scripts lock")
            .pop_front()
            .unwrap_or(Value::Null))
    }

    async fn emulate_media(&self, _media: &str) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn print_pdf(&self, _options: PdfOptions) -> Result<Vec<u8>, BrowserError> {
        Ok(FAKE_PDF.to_vec())
    }

    async fn snapshot_mhtml(&self) -> Result<String, BrowserError> {
        Ok(FAKE_MHTML.to_string())
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>, BrowserError> {
        if !self.tab_scoped_cookies {
            return Ok(self.jar());
        }
        let tab_url = self.url.lock().expect("url lock").clone();
        let host = url::Url::parse(&tab_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        Ok(self
            .jar()
            .into_iter()
            .filter(|c| domain_covers(&c.domain, &host))
            .collect())
    }

    async fn set_cookies(&self, cookies: Vec<SessionCookie>) -> Result<(), BrowserError> {
        let mut jar = self.cookies.lock().expect("cookies lock");
        for cookie in cookies {
            jar.retain(|c| !(c.name == cookie.name && c.domain == cookie.domain));
            jar.push(cookie);
        }
        Ok(())
    }

    async fn user_agent(&self) -> Result<String, BrowserError> {
        Ok(FAKE_USER_AGENT.to_string())
    }
}

fn domain_covers(domain: &str, host: &str) -> bool {
    let domain = domain.trim_start_matches('.');
    !host.is_empty() && (host == domain || host.ends_with(&format!(".{domain}")))
}
