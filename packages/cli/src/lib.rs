//! LayerSplit CLI - split composite walls in a YAML model document.
//!
//! - [`cli`]: argument parsing and command dispatch
//! - [`report`]: human-readable reports
//! - [`error`]: error types and Result alias

pub mod cli;
pub mod error;
pub mod report;

pub use error::{CliError, Result};
