//! Blocking operator confirmation on the terminal.

use std::io::{self, BufRead, Write};

use super::AdapterError;

/// Prints `message` to stderr and waits for the operator to press enter.
///
/// # Errors
///
/// Returns [`AdapterError::Prompt`] if stdin cannot be read.
pub async fn wait_for_enter(message: &str) -> Result<(), AdapterError> {
    let message = message.to_string();
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let mut stderr = io::stderr();
        write!(stderr, "{message} ")?;
        stderr.flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(())
    })
    .await
    .map_err(|e| AdapterError::Prompt(io::Error::other(e)))?
    .map_err(AdapterError::Prompt)
}
