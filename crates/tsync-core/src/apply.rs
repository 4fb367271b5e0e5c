//! Applies an approved subset of a [`ChangeSet`] to an artifact store
//!
//! Changes are applied obsolete first, then new, then updated, so that an
//! artifact removed and re-added under the same name never collides with
//! itself. Each change is independent: a failure is recorded and the rest of
//! the batch still runs. Re-applying the failed subset after fixing the cause
//! converges to the same state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diff::{ChangeCategory, ChangeSet, DiffEntry};
use crate::error::StoreError;
use crate::model::{ArtifactDraft, ArtifactKind};
use crate::store::ArtifactStore;

/// Changes a caller has chosen to apply, per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovedChanges {
    pub obsolete: BTreeMap<String, DiffEntry>,
    pub new: BTreeMap<String, DiffEntry>,
    pub updated: BTreeMap<String, DiffEntry>,
}

impl ApprovedChanges {
    /// Approve every change in `changes`
    pub fn all(changes: &ChangeSet) -> Self {
        Self {
            obsolete: changes.obsolete.clone(),
            new: changes.new.clone(),
            updated: changes.updated.clone(),
        }
    }

    /// Approve the changes whose names are in `names`, whatever their category
    pub fn select<'a, I>(changes: &ChangeSet, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut approved = Self::default();
        for name in names {
            if let Some(entry) = changes.obsolete.get(name) {
                approved.obsolete.insert(name.to_string(), entry.clone());
            }
            if let Some(entry) = changes.new.get(name) {
                approved.new.insert(name.to_string(), entry.clone());
            }
            if let Some(entry) = changes.updated.get(name) {
                approved.updated.insert(name.to_string(), entry.clone());
            }
        }
        approved
    }

    pub fn is_empty(&self) -> bool {
        self.obsolete.is_empty() && self.new.is_empty() && self.updated.is_empty()
    }

    pub fn len(&self) -> usize {
        self.obsolete.len() + self.new.len() + self.updated.len()
    }
}

impl ChangeSet {
    pub fn approve_all(&self) -> ApprovedChanges {
        ApprovedChanges::all(self)
    }

    pub fn approve<'a, I>(&self, names: I) -> ApprovedChanges
    where
        I: IntoIterator<Item = &'a str>,
    {
        ApprovedChanges::select(self, names)
    }
}

/// A change that was written to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAction {
    pub name: String,
    pub category: ChangeCategory,
    pub kind: ArtifactKind,
}

/// A change the store refused or could not locate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyError {
    pub name: String,
    pub category: ChangeCategory,
    pub message: String,
}

impl std::fmt::Display for ApplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.category, self.message)
    }
}

/// Outcome of an apply pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub applied: Vec<AppliedAction>,
    pub errors: Vec<ApplyError>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages in the order the failures happened
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    fn record(&mut self, entry: &DiffEntry, result: Result<(), StoreError>) {
        match result {
            Ok(()) => {
                tracing::info!(
                    name = %entry.name,
                    category = %entry.category,
                    kind = %entry.kind,
                    "Applied template change"
                );
                self.applied.push(AppliedAction {
                    name: entry.name.clone(),
                    category: entry.category,
                    kind: entry.kind.clone(),
                });
            }
            Err(e) => {
                tracing::warn!(
                    name = %entry.name,
                    category = %entry.category,
                    error = %e,
                    "Failed to apply template change"
                );
                self.errors.push(ApplyError {
                    name: entry.name.clone(),
                    category: entry.category,
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Writes approved changes to a store
pub struct SyncApplier<'a> {
    store: &'a mut dyn ArtifactStore,
}

impl<'a> SyncApplier<'a> {
    pub fn new(store: &'a mut dyn ArtifactStore) -> Self {
        Self { store }
    }

    /// Apply `approved`; never fails as a whole, see [`ApplyReport::errors`]
    pub fn apply(&mut self, approved: &ApprovedChanges) -> ApplyReport {
        let mut report = ApplyReport::default();
        if approved.is_empty() {
            tracing::debug!("No template changes approved");
            return report;
        }

        for entry in approved.obsolete.values() {
            let result = self.remove(entry);
            report.record(entry, result);
        }
        for entry in approved.new.values() {
            let result = self.add(entry);
            report.record(entry, result);
        }
        for entry in approved.updated.values() {
            let result = self.update(entry);
            report.record(entry, result);
        }
        report
    }

    fn remove(&mut self, entry: &DiffEntry) -> Result<(), StoreError> {
        let existing = self
            .store
            .find(&entry.name, &entry.kind)
            .filter(|found| found.kind() == entry.kind)
            .ok_or_else(|| not_found(entry))?;
        self.store.delete(&existing)
    }

    fn add(&mut self, entry: &DiffEntry) -> Result<(), StoreError> {
        let draft = self.draft(entry)?;
        self.store.create(draft).map(|_| ())
    }

    fn update(&mut self, entry: &DiffEntry) -> Result<(), StoreError> {
        let draft = self.draft(entry)?;
        let existing = self
            .store
            .find(&entry.name, &entry.kind)
            .ok_or_else(|| not_found(entry))?;
        self.store.update(&existing, draft).map(|_| ())
    }

    /// Store fields for a new/updated entry, checking its kind is known
    fn draft(&self, entry: &DiffEntry) -> Result<ArtifactDraft, StoreError> {
        let metadata = entry.metadata().ok_or_else(|| StoreError::Invalid {
            name: entry.name.clone(),
            message: "no template data to write".to_string(),
        })?;
        if let ArtifactKind::Template(kind) = &metadata.kind
            && !self.store.has_template_kind(kind)
        {
            return Err(StoreError::UnknownKind { kind: kind.clone() });
        }
        Ok(ArtifactDraft::from_metadata(metadata))
    }
}

fn not_found(entry: &DiffEntry) -> StoreError {
    StoreError::NotFound {
        name: entry.name.clone(),
        kind: entry.kind.to_string(),
    }
}
