//! Compare-then-apply entry points
//!
//! One [`ImportContext`] is built per comparison cycle and holds both sides
//! of the comparison; nothing is cached between cycles.

use serde::{Deserialize, Serialize};

use crate::apply::{ApplyReport, ApprovedChanges, SyncApplier};
use crate::catalog::OsCatalog;
use crate::config::ImportConfig;
use crate::diff::{ChangeSet, compute_changes};
use crate::fetch::Fetcher;
use crate::loader::{ArtifactLoader, FetchStatus, LoadedSet, SkippedArtifact};
use crate::model::PersistedArtifact;
use crate::store::ArtifactStore;
use crate::Result;

/// State of a single comparison cycle
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub loaded: LoadedSet,
    pub persisted: Vec<PersistedArtifact>,
}

impl ImportContext {
    pub fn new(loaded: LoadedSet, persisted: Vec<PersistedArtifact>) -> Self {
        Self { loaded, persisted }
    }

    pub fn changes(&self) -> ChangeSet {
        compute_changes(&self.loaded.artifacts, &self.persisted)
    }
}

/// Result of [`Importer::compute_changes`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub changes: ChangeSet,
    pub fetch: FetchStatus,
    pub skipped: Vec<SkippedArtifact>,
}

impl ChangeReport {
    /// Message shown to the user for this report
    pub fn summary(&self) -> String {
        if let FetchStatus::Failed { reason } = &self.fetch {
            return format!("Failed to fetch templates: {}", reason);
        }
        if self.changes.is_empty() {
            "No changes to your templates detected".to_string()
        } else {
            format!(
                "{} new, {} obsolete, {} updated templates",
                self.changes.new.len(),
                self.changes.obsolete.len(),
                self.changes.updated.len()
            )
        }
    }
}

/// Imports templates from a source into an artifact store
#[derive(Debug, Clone, Default)]
pub struct Importer {
    config: ImportConfig,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Build the comparison context: fetch and load templates, list the store.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name filter or if the store cannot be
    /// listed. Fetch and per-template failures are not errors, see
    /// [`LoadedSet`].
    pub fn context(
        &self,
        fetcher: &dyn Fetcher,
        catalog: &dyn OsCatalog,
        store: &dyn ArtifactStore,
    ) -> Result<ImportContext> {
        let loader = ArtifactLoader::new(&self.config, catalog.list_os())?;
        let loaded = loader.load_fetched(fetcher);
        if self.config.verbose {
            tracing::info!(
                templates = loaded.len(),
                skipped = loaded.skipped.len(),
                fetch = ?loaded.fetch,
                "Loaded templates from source"
            );
        }
        let persisted = store.list_all()?;
        Ok(ImportContext::new(loaded, persisted))
    }

    /// Compare the configured source against the store
    pub fn compute_changes(
        &self,
        fetcher: &dyn Fetcher,
        catalog: &dyn OsCatalog,
        store: &dyn ArtifactStore,
    ) -> Result<ChangeReport> {
        let context = self.context(fetcher, catalog, store)?;
        let changes = context.changes();
        Ok(ChangeReport {
            changes,
            fetch: context.loaded.fetch,
            skipped: context.loaded.skipped,
        })
    }

    /// Apply an approved subset, returning the per-change error messages
    pub fn apply_changes(
        &self,
        store: &mut dyn ArtifactStore,
        approved: &ApprovedChanges,
    ) -> Vec<String> {
        self.apply_report(store, approved).error_messages()
    }

    pub fn apply_report(
        &self,
        store: &mut dyn ArtifactStore,
        approved: &ApprovedChanges,
    ) -> ApplyReport {
        SyncApplier::new(store).apply(approved)
    }
}
