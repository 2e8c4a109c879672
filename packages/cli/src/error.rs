//! Error types for the CLI.

use std::path::PathBuf;

use layersplit_engine::SplitError;
use thiserror::Error;

/// Main error type for the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// The engine refused or failed the operation.
    #[error(transparent)]
    Split(#[from] SplitError),

    /// Reading or writing a file failed.
    #[error("Cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Layer numbers start at 1.
    #[error("Invalid layer number {0}: layers are numbered from 1 on the exterior side")]
    InvalidLayer(usize),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
