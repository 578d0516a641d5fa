//! Binary-side plumbing: config file, tracing setup and the run itself.

pub(crate) mod config;
pub(crate) mod runtime;
pub(crate) mod terminal;
