//! Loader for template artifacts from a fetched directory tree
//!
//! Walks the tree in path order, extracts metadata from every template file
//! and keeps the ones passing the name filter. A bad file is logged and
//! recorded in [`LoadedSet::skipped`]; it never aborts the load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ImportConfig;
use crate::extract::MetadataExtractor;
use crate::fetch::Fetcher;
use crate::model::{ArtifactMetadata, OsEntry, RawArtifact};
use crate::{Error, Result};

/// Outcome of the fetch phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    Succeeded,
    /// The source could not be fetched; the loaded set is empty because of
    /// this, not because the source has no templates
    Failed { reason: String },
}

impl FetchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchStatus::Succeeded)
    }
}

/// A template file that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedArtifact {
    pub path: PathBuf,
    pub reason: String,
}

/// Templates loaded from one source, keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedSet {
    pub artifacts: BTreeMap<String, ArtifactMetadata>,
    pub fetch: FetchStatus,
    pub skipped: Vec<SkippedArtifact>,
    /// Names defined by more than one file; the last file in path order wins
    pub duplicates: Vec<String>,
}

impl LoadedSet {
    pub fn empty() -> Self {
        Self {
            artifacts: BTreeMap::new(),
            fetch: FetchStatus::Succeeded,
            skipped: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    pub fn fetch_failed(reason: impl Into<String>) -> Self {
        Self {
            fetch: FetchStatus::Failed {
                reason: reason.into(),
            },
            ..Self::empty()
        }
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ArtifactMetadata> {
        self.artifacts.get(name)
    }

    fn insert(&mut self, metadata: ArtifactMetadata) {
        let name = metadata.name.clone();
        if let Some(previous) = self.artifacts.insert(name.clone(), metadata) {
            tracing::warn!(
                name = %name,
                replaced = %previous.source.display(),
                "Duplicate template name, keeping the later file"
            );
            self.duplicates.push(name);
        }
    }
}

impl Default for LoadedSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builds a [`LoadedSet`] from a template directory tree
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    config: ImportConfig,
    extractor: MetadataExtractor,
    filter: Option<Regex>,
}

impl ArtifactLoader {
    /// Create a loader for `config`, resolving OS references against `catalog`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured name filter is not a valid regex.
    pub fn new(config: &ImportConfig, catalog: Vec<OsEntry>) -> Result<Self> {
        let filter = config.compiled_filter()?;
        let extractor = MetadataExtractor::new(catalog).with_prefix(config.name_prefix());
        Ok(Self {
            config: config.clone(),
            extractor,
            filter,
        })
    }

    /// Fetch the configured source and load it.
    ///
    /// Fetch failures are logged and yield an empty set flagged
    /// [`FetchStatus::Failed`]. The fetched tree is released before returning.
    pub fn load_fetched(&self, fetcher: &dyn Fetcher) -> LoadedSet {
        let tree = match fetcher.fetch(&self.config.source_uri, self.config.git_ref()) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!(
                    source = %self.config.source_uri,
                    error = %e,
                    "Failed to fetch templates"
                );
                return LoadedSet::fetch_failed(e.to_string());
            }
        };
        tracing::info!(
            source = %self.config.source_uri,
            root = %tree.root().display(),
            "Fetched template source"
        );
        self.load_dir(tree.root())
    }

    /// Load templates below `root` joined with the configured subpath
    pub fn load_dir(&self, root: &Path) -> LoadedSet {
        let base = self.config.load_root(root);
        let mut loaded = LoadedSet::empty();

        let files = match template_files(&base, &self.config.extension) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(path = %base.display(), error = %e, "Cannot read template directory");
                return loaded;
            }
        };

        for path in files {
            // Relative to the tree root so the directory still names the kind
            // when a subpath is configured
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            match self.load_file(&path, &relative) {
                Ok(Some(metadata)) => loaded.insert(metadata),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %relative.display(), error = %e, "Skipping template");
                    loaded.skipped.push(SkippedArtifact {
                        path: relative,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            count = loaded.len(),
            skipped = loaded.skipped.len(),
            "Loaded templates"
        );
        loaded
    }

    fn load_file(&self, path: &Path, relative: &Path) -> Result<Option<ArtifactMetadata>> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let raw = RawArtifact::new(relative, content);

        let Some(metadata) = self.extractor.extract(&raw)? else {
            tracing::debug!(path = %relative.display(), "No metadata header");
            return Ok(None);
        };
        if let Some(filter) = &self.filter
            && !filter.is_match(&metadata.name)
        {
            return Ok(None);
        }
        Ok(Some(metadata))
    }
}

/// All files below `dir` with `extension`, sorted by path
fn template_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files(dir, extension, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, extension: &str, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if path.file_name().is_some_and(|name| name == ".git") {
                continue;
            }
            collect_files(&path, extension, files)?;
        } else if path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::FetchedTree;
    use crate::model::ArtifactKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn loader(config: &ImportConfig) -> ArtifactLoader {
        ArtifactLoader::new(config, vec![OsEntry::new(1, "CentOS 7", Some("Redhat"))]).unwrap()
    }

    #[test]
    fn test_loads_only_template_files_with_headers() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "snippets/motd.erb", "<%#\nkind: snippet\n%>\nhello");
        write(temp.path(), "snippets/plain.erb", "no header here");
        write(temp.path(), "snippets/README.md", "<%#\nname: readme\n%>");
        write(temp.path(), ".git/hooks/x.erb", "<%#\nname: hidden\nkind: snippet\n%>");

        let loaded = loader(&ImportConfig::default()).load_dir(temp.path());

        assert_eq!(loaded.artifacts.keys().collect::<Vec<_>>(), vec!["motd"]);
        assert!(loaded.fetch.is_success());
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_bad_file_does_not_abort_load() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "snippets/a.erb", "<%#\nkind: snippet\n%>");
        write(temp.path(), "snippets/b.erb", "<%#\nname: [oops\n%>");
        write(temp.path(), "snippets/c.erb", "<%#\nkind: snippet\n%>");

        let loaded = loader(&ImportConfig::default()).load_dir(temp.path());

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].path, PathBuf::from("snippets/b.erb"));
    }

    #[test]
    fn test_duplicate_names_last_path_wins() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/motd.erb", "<%#\nname: motd\nkind: snippet\n%>\nfirst");
        write(temp.path(), "b/motd.erb", "<%#\nname: motd\nkind: snippet\n%>\nsecond");

        let loaded = loader(&ImportConfig::default()).load_dir(temp.path());

        assert_eq!(loaded.len(), 1);
        assert!(loaded.get("motd").unwrap().body.ends_with("second"));
        assert_eq!(loaded.duplicates, vec!["motd"]);
    }

    #[test]
    fn test_filter_and_prefix() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "provision/ks.erb", "<%#\nname: Kickstart default\n%>");
        write(temp.path(), "provision/ps.erb", "<%#\nname: Preseed default\n%>");

        let config = ImportConfig::default()
            .with_filter("KICKSTART")
            .with_prefix("Community");
        let loaded = loader(&config).load_dir(temp.path());

        let metadata = loaded.get("Community Kickstart default").unwrap();
        assert_eq!(metadata.kind, ArtifactKind::Template("provision".to_string()));
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_subpath_restricts_walk() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "core/snippets/a.erb", "<%#\nkind: snippet\n%>");
        write(temp.path(), "extra/snippets/b.erb", "<%#\nkind: snippet\n%>");

        let config = ImportConfig::default().with_subpath("/core");
        let loaded = loader(&config).load_dir(temp.path());

        assert_eq!(loaded.artifacts.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_subpath_keeps_directory_kind() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "snippets/motd.erb", "<%#\nname: motd\n%>\nhello");
        write(temp.path(), "snippets/banner.erb", "<%#\nname: banner\n%>\nwelcome");

        let config = ImportConfig::default().with_subpath("/snippets");
        let loaded = loader(&config).load_dir(temp.path());

        assert!(loaded.skipped.is_empty(), "{:?}", loaded.skipped);
        assert_eq!(loaded.artifacts.keys().collect::<Vec<_>>(), vec!["banner", "motd"]);
        let motd = loaded.get("motd").unwrap();
        assert_eq!(motd.kind, ArtifactKind::Snippet);
        assert_eq!(motd.source, PathBuf::from("snippets/motd.erb"));
    }

    #[test]
    fn test_missing_directory_is_empty_not_failed() {
        let temp = TempDir::new().unwrap();
        let config = ImportConfig::default().with_subpath("nope");
        let loaded = loader(&config).load_dir(temp.path());
        assert!(loaded.is_empty());
        assert!(loaded.fetch.is_success());
    }

    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn fetch(&self, uri: &str, _: Option<&str>) -> std::result::Result<FetchedTree, FetchError> {
            Err(FetchError::remote(uri, "connection refused"))
        }
    }

    #[test]
    fn test_fetch_failure_is_flagged() {
        let loaded = loader(&ImportConfig::default()).load_fetched(&FailingFetcher);
        assert!(loaded.is_empty());
        assert!(matches!(
            &loaded.fetch,
            FetchStatus::Failed { reason } if reason.contains("connection refused")
        ));
    }

    #[test]
    fn test_invalid_filter_rejected_up_front() {
        let config = ImportConfig::default().with_filter("[");
        assert!(ArtifactLoader::new(&config, Vec::new()).is_err());
    }
}
