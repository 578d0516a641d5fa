//! Session cookies: seed-file loading and the browser/HTTP cookie bridge.
//!
//! Seed cookies are injected into the browser before the first navigation.
//! Direct downloads borrow the browser's cookies for the target host and
//! hand any `Set-Cookie` headers back to the browser.

mod bridge;
mod cookies;

pub use bridge::{
    absorb_set_cookies, cookie_domain_matches, cookie_header_for, cookies_from_response,
    inject_seed_cookies, session_cookie_header,
};
pub use cookies::{
    CookieError, SeedCookies, SessionCookie, load_seed_cookies, parse_seed_cookies,
    seed_cookie_path,
};
