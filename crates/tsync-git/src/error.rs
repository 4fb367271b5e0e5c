//! Error types for tsync-git

/// Result type for tsync-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching a template repository
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to clone {url}: {message}")]
    Clone { url: String, message: String },

    /// The requested branch, tag or commit does not exist in the clone
    #[error("Cannot check out '{git_ref}' from {url}: {message}")]
    Ref {
        url: String,
        git_ref: String,
        message: String,
    },

    #[error("Failed to create working directory: {0}")]
    WorkDir(#[from] std::io::Error),
}

impl From<Error> for tsync_core::FetchError {
    fn from(err: Error) -> Self {
        match err {
            Error::Clone { url, message } => tsync_core::FetchError::remote(url, message),
            Error::Ref {
                url,
                git_ref,
                message,
            } => tsync_core::FetchError::remote(
                url,
                format!("cannot check out '{git_ref}': {message}"),
            ),
            Error::WorkDir(source) => tsync_core::FetchError::WorkDir(source),
        }
    }
}
