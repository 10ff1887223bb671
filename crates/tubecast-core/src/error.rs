//! Shared failure type for all tubecast crates.
//!
//! Everything that can go wrong ends up as an [`Error`], so HTTP handlers can
//! derive a status code from the variant alone via [`Error::http_status`].

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity does not exist.
    #[error("no such {entity}: {id}")]
    NotFound {
        /// What was looked up ("channel", "stream", "rendition").
        entity: String,
        /// The identifier that missed.
        id: String,
    },

    /// Input or configuration data was rejected.
    #[error("invalid: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("i/o failure: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// An external tool (yt-dlp, ffmpeg) failed or is unavailable.
    #[error("{tool}: {message}")]
    Tool { tool: String, message: String },

    /// Resolving or preparing upstream video content failed. The message is
    /// already self-describing, so it is shown as-is.
    #[error("{0}")]
    Fetch(String),

    /// Unexpected internal failure.
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status code this error should surface as. Upstream trouble
    /// (tools, fetches) maps to 502 since the fault lies beyond this server.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Io { .. } => 500,
            Error::Tool { .. } => 502,
            Error::Fetch(_) => 502,
            Error::Internal(_) => 500,
        }
    }

    /// A [`Error::NotFound`] for `entity` identified by `id`.
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// A [`Error::Tool`] failure attributed to `tool`.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// A [`Error::Fetch`] with the given message.
    pub fn fetch(message: impl Into<String>) -> Self {
        Error::Fetch(message.into())
    }

    /// A [`Error::Internal`] with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
