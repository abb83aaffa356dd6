//! Error types for the hexview streaming engine.
//!
//! Every failure the engine can surface is a variant of [`HexViewError`].
//! Source failures abort the running session; plugin failures only abort the
//! `load` call that produced them.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for hexview operations.
#[derive(Debug, Error)]
pub enum HexViewError {
    /// The source could not be opened (missing file, permissions, ...)
    #[error("{}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure in the middle of the stream
    #[error("Read error at offset {offset:#x}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// No plugin with this name could be resolved
    #[error("{name}: plugin not found")]
    PluginResolution { name: String },

    /// The plugin was found but did not produce an instance
    #[error("{name}: plugin initialization failed")]
    PluginInit { name: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration (de)serialization errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O errors outside of a session (configuration files, ...)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HexViewError {
    /// True for failures that end the current session.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self, HexViewError::Open { .. } | HexViewError::Read { .. })
    }
}

/// Result type alias for hexview operations
pub type Result<T> = std::result::Result<T, HexViewError>;
