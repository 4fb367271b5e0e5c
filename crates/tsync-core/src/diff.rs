//! Diff engine: loaded templates vs persisted artifacts
//!
//! Every name seen on either side lands in exactly one category: new,
//! obsolete, updated or unchanged. Only the first three are reported.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::model::{ArtifactKind, ArtifactMetadata, ConfigRecord, LayoutRecord, PersistedArtifact};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    New,
    Obsolete,
    Updated,
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeCategory::New => f.write_str("new"),
            ChangeCategory::Obsolete => f.write_str("obsolete"),
            ChangeCategory::Updated => f.write_str("updated"),
        }
    }
}

/// Field of a persisted artifact compared against its template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedField {
    OsFamily,
    LayoutText,
    Kind,
    OperatingSystems,
    TemplateText,
}

impl ChangedField {
    pub fn summary(&self) -> &'static str {
        match self {
            ChangedField::OsFamily => "OS family changed",
            ChangedField::LayoutText => "Layout changes",
            ChangedField::Kind => "Template kind changed",
            ChangedField::OperatingSystems => "Operating systems changed",
            ChangedField::TemplateText => "Template changes",
        }
    }
}

/// One differing field with a unified diff of old and new values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: ChangedField,
    pub summary: String,
    pub diff: String,
}

impl FieldChange {
    fn new(field: ChangedField, old: &str, new: &str) -> Self {
        Self {
            field,
            summary: field.summary().to_string(),
            diff: unified_diff(old, new),
        }
    }
}

/// Data carried by a diff entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "metadata", rename_all = "snake_case")]
pub enum DiffPayload {
    /// Everything needed to write the artifact
    Metadata(ArtifactMetadata),
    /// Name and kind only, enough to locate the artifact
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub name: String,
    pub category: ChangeCategory,
    pub kind: ArtifactKind,
    pub payload: DiffPayload,
    /// Differing fields, only filled for updated entries
    #[serde(default)]
    pub changes: Vec<FieldChange>,
}

impl DiffEntry {
    pub fn metadata(&self) -> Option<&ArtifactMetadata> {
        match &self.payload {
            DiffPayload::Metadata(metadata) => Some(metadata),
            DiffPayload::Reference => None,
        }
    }
}

/// Categorized result of one comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub new: BTreeMap<String, DiffEntry>,
    pub obsolete: BTreeMap<String, DiffEntry>,
    pub updated: BTreeMap<String, DiffEntry>,
    /// Names present on both sides without differences
    #[serde(default)]
    pub unchanged: BTreeSet<String>,
}

impl ChangeSet {
    /// True when there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.obsolete.is_empty() && self.updated.is_empty()
    }

    /// Number of reported changes
    pub fn len(&self) -> usize {
        self.new.len() + self.obsolete.len() + self.updated.len()
    }

    pub fn category(&self, category: ChangeCategory) -> &BTreeMap<String, DiffEntry> {
        match category {
            ChangeCategory::New => &self.new,
            ChangeCategory::Obsolete => &self.obsolete,
            ChangeCategory::Updated => &self.updated,
        }
    }

    /// Category a name was classified into, `None` for unchanged or unknown
    pub fn category_of(&self, name: &str) -> Option<ChangeCategory> {
        [
            ChangeCategory::New,
            ChangeCategory::Obsolete,
            ChangeCategory::Updated,
        ]
        .into_iter()
        .find(|category| self.category(*category).contains_key(name))
    }
}

/// Compare loaded templates against persisted artifacts
pub fn compute_changes(
    loaded: &BTreeMap<String, ArtifactMetadata>,
    persisted: &[PersistedArtifact],
) -> ChangeSet {
    let mut changes = ChangeSet::default();
    let persisted = persisted_by_name(loaded, persisted);

    for (name, metadata) in loaded {
        if !persisted.contains_key(name.as_str()) {
            changes.new.insert(
                name.clone(),
                DiffEntry {
                    name: name.clone(),
                    category: ChangeCategory::New,
                    kind: metadata.kind.clone(),
                    payload: DiffPayload::Metadata(metadata.clone()),
                    changes: Vec::new(),
                },
            );
        }
    }

    for (&name, &artifact) in &persisted {
        match loaded.get(name) {
            None => {
                changes.obsolete.insert(
                    name.to_string(),
                    DiffEntry {
                        name: name.to_string(),
                        category: ChangeCategory::Obsolete,
                        kind: artifact.kind(),
                        payload: DiffPayload::Reference,
                        changes: Vec::new(),
                    },
                );
            }
            Some(metadata) => {
                let field_changes = compare(artifact, metadata);
                if field_changes.is_empty() {
                    changes.unchanged.insert(name.to_string());
                } else {
                    tracing::debug!(name = %name, fields = field_changes.len(), "Template differs");
                    changes.updated.insert(
                        name.to_string(),
                        DiffEntry {
                            name: name.to_string(),
                            category: ChangeCategory::Updated,
                            kind: metadata.kind.clone(),
                            payload: DiffPayload::Metadata(metadata.clone()),
                            changes: field_changes,
                        },
                    );
                }
            }
        }
    }

    tracing::info!(
        new = changes.new.len(),
        obsolete = changes.obsolete.len(),
        updated = changes.updated.len(),
        unchanged = changes.unchanged.len(),
        "Computed template changes"
    );
    changes
}

/// One persisted artifact per name.
///
/// Names are the identity, so a store holding two artifacts with the same
/// name is reported and only one of them is compared: the one whose variant
/// matches the loaded template, then the lowest id.
fn persisted_by_name<'a>(
    loaded: &BTreeMap<String, ArtifactMetadata>,
    persisted: &'a [PersistedArtifact],
) -> BTreeMap<&'a str, &'a PersistedArtifact> {
    let rank = |artifact: &PersistedArtifact| {
        let other_variant = loaded
            .get(artifact.name())
            .is_some_and(|m| m.kind.is_layout() != artifact.is_layout());
        (other_variant, artifact.id())
    };

    let mut by_name: BTreeMap<&str, &PersistedArtifact> = BTreeMap::new();
    for artifact in persisted {
        match by_name.entry(artifact.name()) {
            Entry::Vacant(slot) => {
                slot.insert(artifact);
            }
            Entry::Occupied(mut slot) => {
                let (kept, ignored) = if rank(artifact) < rank(slot.get()) {
                    (artifact, slot.insert(artifact))
                } else {
                    (*slot.get(), artifact)
                };
                tracing::warn!(
                    name = %artifact.name(),
                    kept = %kept.kind_label(),
                    ignored = %ignored.kind_label(),
                    "Persisted artifacts share a name, comparing only one"
                );
            }
        }
    }
    by_name
}

/// Field-by-field comparison of a persisted artifact with its template
pub fn compare(artifact: &PersistedArtifact, metadata: &ArtifactMetadata) -> Vec<FieldChange> {
    match artifact {
        PersistedArtifact::Layout(layout) => compare_layout(layout, metadata),
        PersistedArtifact::Config(config) => {
            compare_config(config, &artifact.kind(), metadata)
        }
    }
}

fn compare_layout(layout: &LayoutRecord, metadata: &ArtifactMetadata) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    // Family detection depends on the OS catalog; an unresolved family is not a change
    if let Some(family) = &metadata.os_family
        && layout.os_family.as_ref() != Some(family)
    {
        changes.push(FieldChange::new(
            ChangedField::OsFamily,
            layout.os_family.as_deref().unwrap_or_default(),
            family,
        ));
    }
    if layout.layout_text != metadata.body {
        changes.push(FieldChange::new(
            ChangedField::LayoutText,
            &layout.layout_text,
            &metadata.body,
        ));
    }
    changes
}

fn compare_config(
    config: &ConfigRecord,
    kind: &ArtifactKind,
    metadata: &ArtifactMetadata,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if *kind != metadata.kind {
        changes.push(FieldChange::new(
            ChangedField::Kind,
            kind.label(),
            metadata.kind.label(),
        ));
    }
    if config.os_ids != metadata.os_ids {
        changes.push(FieldChange::new(
            ChangedField::OperatingSystems,
            &render_ids(&config.os_ids),
            &render_ids(&metadata.os_ids),
        ));
    }
    if config.template_text != metadata.body {
        changes.push(FieldChange::new(
            ChangedField::TemplateText,
            &config.template_text,
            &metadata.body,
        ));
    }
    changes
}

fn render_ids(ids: &BTreeSet<u64>) -> String {
    ids.iter().map(|id| format!("{}\n", id)).collect()
}

fn unified_diff(old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header("persisted", "template")
        .to_string()
}
