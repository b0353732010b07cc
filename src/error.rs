// ABOUTME: Error types for bedrock-agent-chat — configuration, invocation, and log read-back.
// ABOUTME: One thiserror enum shared by the client, logger, and config layers.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for all chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Bad or missing identifiers, malformed agent ARN. Fatal before any remote call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote agent runtime reported a failure for one invocation.
    #[error("failed to invoke agent ({code}): {message}")]
    Invocation { code: String, message: String },

    /// A non-blank history line could not be parsed during read-back.
    #[error("malformed log entry at {path}:{line}: {source}")]
    MalformedLog {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The reply stream contained an event that could not be decoded.
    #[error("stream decode error: {0}")]
    Stream(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChatError {
    /// Create an invocation error from a remote error code and message.
    pub fn invocation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invocation {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-log error for a specific line of a history file.
    pub fn malformed_log(path: impl Into<PathBuf>, line: usize, source: serde_json::Error) -> Self {
        Self::MalformedLog {
            path: path.into(),
            line,
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChatError>;
