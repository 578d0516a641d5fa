//! Error types for the browser module.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while driving the browser tab.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Browser process could not be launched or configured.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// A DevTools protocol command failed.
    #[error("browser command `{command}` failed: {message}")]
    Command {
        /// Short name of the failing operation (`goto`, `pdf`, ...).
        command: &'static str,
        /// Underlying CDP error text.
        message: String,
    },

    /// Navigation to a URL failed.
    #[error("navigation to {url} failed: {message}")]
    Navigation {
        /// Target URL.
        url: String,
        /// Underlying CDP error text.
        message: String,
    },

    /// The page never went network-idle within the allowed time.
    #[error("page did not reach network idle within {timeout:?} ({in_flight} requests in flight)")]
    IdleTimeout {
        /// Configured bound.
        timeout: Duration,
        /// Requests still outstanding when the bound expired.
        in_flight: usize,
    },

    /// A page script returned a value that could not be decoded.
    #[error("page script returned an unexpected value: {0}")]
    Script(String),
}

impl BrowserError {
    /// Creates a command error.
    pub fn command(command: &'static str, message: impl ToString) -> Self {
        Self::Command {
            command,
            message: message.to_string(),
        }
    }

    /// Creates a navigation error.
    pub fn navigation(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }
}
