//! Git-backed template source

use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{FetchOptions, RemoteCallbacks, Repository};
use tempfile::TempDir;
use tsync_core::{FetchError, FetchedTree, Fetcher, ImportConfig};

use crate::{Error, Result};

/// Clones the template repository into a temporary directory.
///
/// The checkout is removed when the returned [`FetchedTree`] is dropped.
#[derive(Debug, Clone, Default)]
pub struct GitFetcher {
    /// Log remote progress and the checked out commit at info level
    verbose: bool,
}

impl GitFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher honouring the `verbose` flag of `config`
    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new().verbose(config.verbose)
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn clone_into(&self, url: &str, git_ref: Option<&str>) -> Result<TempDir> {
        let dir = TempDir::new()?;
        clone_repo(url, dir.path(), git_ref, self.verbose)?;
        Ok(dir)
    }
}

impl Fetcher for GitFetcher {
    fn fetch(
        &self,
        source_uri: &str,
        git_ref: Option<&str>,
    ) -> std::result::Result<FetchedTree, FetchError> {
        tracing::info!(url = %source_uri, git_ref = ?git_ref, "Cloning template repository");
        let dir = self.clone_into(source_uri, git_ref)?;
        Ok(FetchedTree::owned(dir))
    }
}

/// Clone `url` into `dest`, then check out `git_ref` when given.
///
/// # Arguments
/// * `url` - Git repository URL or local path
/// * `dest` - Empty destination directory
/// * `git_ref` - Branch, tag or commit to check out instead of the remote default
/// * `verbose` - Log remote progress messages and the resulting commit at info level
pub fn clone_repo(url: &str, dest: &Path, git_ref: Option<&str>, verbose: bool) -> Result<()> {
    let mut callbacks = RemoteCallbacks::new();
    if verbose {
        callbacks.sideband_progress(|data| {
            let line = String::from_utf8_lossy(data);
            let line = line.trim();
            if !line.is_empty() {
                tracing::info!(remote = %line, "git");
            }
            true
        });
    }
    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);
    let repo = builder.clone(url, dest).map_err(|e| Error::Clone {
        url: url.to_string(),
        message: e.message().to_string(),
    })?;

    if let Some(git_ref) = git_ref {
        checkout_ref(&repo, git_ref).map_err(|e| Error::Ref {
            url: url.to_string(),
            git_ref: git_ref.to_string(),
            message: e.message().to_string(),
        })?;
    }

    let head = repo
        .head()
        .and_then(|head| head.peel_to_commit())
        .map_err(|e| Error::Clone {
            url: url.to_string(),
            message: e.message().to_string(),
        })?;
    let summary = head.summary().unwrap_or_default();
    if verbose {
        tracing::info!(url = %url, commit = %head.id(), summary = %summary, "Checked out template source");
    } else {
        tracing::debug!(url = %url, commit = %head.id(), dest = %dest.display(), "Clone complete");
    }
    Ok(())
}

/// Check out `git_ref` on a detached HEAD, trying a remote branch of that
/// name before any other revision (tag, commit)
fn checkout_ref(repo: &Repository, git_ref: &str) -> std::result::Result<(), git2::Error> {
    let object = repo
        .revparse_single(&format!("origin/{git_ref}"))
        .or_else(|_| repo.revparse_single(git_ref))?;
    let commit = object.peel_to_commit()?;

    let mut checkout = CheckoutBuilder::new();
    checkout.force();
    repo.checkout_tree(commit.as_object(), Some(&mut checkout))?;
    repo.set_head_detached(commit.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_requires_valid_url() {
        let temp = TempDir::new().unwrap();
        let result = clone_repo("not-a-valid-url", temp.path(), None, false);
        assert!(matches!(result, Err(Error::Clone { .. })));
    }

    #[test]
    fn test_fetch_failure_maps_to_fetch_error() {
        let err = GitFetcher::new()
            .fetch("/no/such/repository", None)
            .unwrap_err();
        assert!(matches!(err, FetchError::Remote { uri, .. } if uri == "/no/such/repository"));
    }

    #[test]
    fn test_ref_error_keeps_url() {
        let err: FetchError = Error::Ref {
            url: "https://example.com/t.git".to_string(),
            git_ref: "v9".to_string(),
            message: "revspec 'v9' not found".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            FetchError::Remote { uri, message }
                if uri == "https://example.com/t.git" && message.contains("'v9'")
        ));
    }

    #[test]
    fn test_from_config_takes_verbose_flag() {
        let config = ImportConfig {
            verbose: true,
            ..ImportConfig::default()
        };
        assert!(GitFetcher::from_config(&config).verbose);
        assert!(!GitFetcher::new().verbose);
    }
}
