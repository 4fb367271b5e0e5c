//! Fetch collaborator: makes a template source available on disk

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::FetchError;

/// A fetched template tree.
///
/// Owned trees live in a temporary directory that is removed when the value
/// is dropped, on success and failure paths alike.
#[derive(Debug)]
pub enum FetchedTree {
    Owned(TempDir),
    Local(PathBuf),
}

impl FetchedTree {
    pub fn owned(dir: TempDir) -> Self {
        FetchedTree::Owned(dir)
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        FetchedTree::Local(path.into())
    }

    pub fn root(&self) -> &Path {
        match self {
            FetchedTree::Owned(dir) => dir.path(),
            FetchedTree::Local(path) => path,
        }
    }
}

/// Retrieves a template source into a local directory tree
pub trait Fetcher {
    /// Fetch `source_uri` at `git_ref` (the source's default when `None`)
    fn fetch(&self, source_uri: &str, git_ref: Option<&str>) -> Result<FetchedTree, FetchError>;
}

/// Uses `source_uri` as a path to an existing directory
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

impl Fetcher for LocalFetcher {
    fn fetch(&self, source_uri: &str, git_ref: Option<&str>) -> Result<FetchedTree, FetchError> {
        let path = PathBuf::from(source_uri);
        if !path.is_dir() {
            return Err(FetchError::MissingDirectory { path });
        }
        if let Some(git_ref) = git_ref {
            tracing::debug!(git_ref = %git_ref, "Local source ignores ref");
        }
        Ok(FetchedTree::local(path))
    }
}
