//! Error types for tsync-core

use std::path::PathBuf;

/// Result type for tsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The embedded header block exists but is not valid YAML
    #[error("Malformed metadata header in {path}: {message}")]
    MalformedHeader { path: PathBuf, message: String },

    /// No explicit kind and none derivable from the file location
    #[error("Cannot determine template kind for {path}")]
    MissingKind { path: PathBuf },

    #[error("Invalid name filter '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors reported by an [`ArtifactStore`](crate::store::ArtifactStore)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} '{name}' not found")]
    NotFound { name: String, kind: String },

    #[error("Name '{name}' has already been taken")]
    Duplicate { name: String },

    #[error("Unknown template kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("Validation failed for '{name}': {message}")]
    Invalid { name: String, message: String },

    #[error("Store error: {0}")]
    Backend(String),
}

/// Errors reported by a [`Fetcher`](crate::fetch::Fetcher)
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch {uri}: {message}")]
    Remote { uri: String, message: String },

    #[error("Source directory not found: {path}")]
    MissingDirectory { path: PathBuf },

    #[error("Failed to prepare working directory: {0}")]
    WorkDir(#[source] std::io::Error),
}

impl FetchError {
    pub fn remote(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            uri: uri.into(),
            message: message.into(),
        }
    }
}
