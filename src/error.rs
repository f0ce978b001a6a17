//! Error types for lookup and configuration.
//!
//! Parsing itself has no error type: malformed markup degrades fields to
//! their empty defaults instead.

use crate::record::Edition;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by the retrieval collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetrievalError {
    /// Transport-level failure (connection, HTTP status, decoding)
    #[error("transport error: {0}")]
    Transport(String),

    /// Retrieval exceeded the caller's deadline
    #[error("retrieval timed out after {0:?}")]
    Timeout(Duration),
}

impl RetrievalError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Hard failure of `get_record`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("word {word:?} not found in {edition} edition")]
    NotFound { edition: Edition, word: String },

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Failure loading extraction tables
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read schema file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
