//! Store collaborator for persisted artifacts
//!
//! [`ArtifactStore`] is the capability set the applier needs; [`MemoryStore`]
//! is an in-memory implementation with the same validation rules a database
//! backed store is expected to enforce.

use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::model::{ArtifactDraft, ArtifactKind, ConfigRecord, LayoutRecord, PersistedArtifact};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait ArtifactStore {
    /// Every persisted artifact, layouts and config templates alike
    fn list_all(&self) -> StoreResult<Vec<PersistedArtifact>>;

    /// Find an artifact by name, looking first among the variant `kind_hint`
    /// maps to
    fn find(&self, name: &str, kind_hint: &ArtifactKind) -> Option<PersistedArtifact>;

    /// Whether the template kind catalog knows `name`
    fn has_template_kind(&self, name: &str) -> bool;

    fn create(&mut self, draft: ArtifactDraft) -> StoreResult<PersistedArtifact>;

    /// Overwrite the mutable fields of `existing` with `draft`
    fn update(
        &mut self,
        existing: &PersistedArtifact,
        draft: ArtifactDraft,
    ) -> StoreResult<PersistedArtifact>;

    fn delete(&mut self, existing: &PersistedArtifact) -> StoreResult<()>;
}

/// In-memory artifact store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    layouts: Vec<LayoutRecord>,
    configs: Vec<ConfigRecord>,
    template_kinds: BTreeSet<String>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the template kind catalog
    pub fn with_template_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template_kinds.extend(kinds.into_iter().map(Into::into));
        self
    }

    pub fn add_template_kind(&mut self, kind: impl Into<String>) {
        self.template_kinds.insert(kind.into());
    }

    pub fn len(&self) -> usize {
        self.layouts.len() + self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn layouts(&self) -> &[LayoutRecord] {
        &self.layouts
    }

    pub fn configs(&self) -> &[ConfigRecord] {
        &self.configs
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn find_layout(&self, name: &str) -> Option<&LayoutRecord> {
        self.layouts.iter().find(|l| l.name == name)
    }

    fn find_config(&self, name: &str) -> Option<&ConfigRecord> {
        self.configs.iter().find(|c| c.name == name)
    }

    /// Validate `draft`, ignoring the record with id `current` for uniqueness
    fn validate(&self, draft: &ArtifactDraft, current: Option<u64>) -> StoreResult<()> {
        let name = draft.name();
        if name.trim().is_empty() {
            return Err(StoreError::Invalid {
                name: name.to_string(),
                message: "name can't be blank".to_string(),
            });
        }

        // Names are unique across layouts and config templates
        let taken = self.find_layout(name).is_some_and(|l| Some(l.id) != current)
            || self.find_config(name).is_some_and(|c| Some(c.id) != current);
        if taken {
            return Err(StoreError::Duplicate {
                name: name.to_string(),
            });
        }

        match draft {
            ArtifactDraft::Layout { layout_text, .. } if layout_text.trim().is_empty() => {
                Err(StoreError::Invalid {
                    name: name.to_string(),
                    message: "layout can't be blank".to_string(),
                })
            }
            ArtifactDraft::Config {
                snippet: false,
                kind_name,
                ..
            } => match kind_name.as_deref() {
                Some(kind) if self.template_kinds.contains(kind) => Ok(()),
                Some(kind) => Err(StoreError::UnknownKind {
                    kind: kind.to_string(),
                }),
                None => Err(StoreError::Invalid {
                    name: name.to_string(),
                    message: "template kind can't be blank".to_string(),
                }),
            },
            _ => Ok(()),
        }
    }
}

impl ArtifactStore for MemoryStore {
    fn list_all(&self) -> StoreResult<Vec<PersistedArtifact>> {
        Ok(self
            .configs
            .iter()
            .cloned()
            .map(PersistedArtifact::Config)
            .chain(self.layouts.iter().cloned().map(PersistedArtifact::Layout))
            .collect())
    }

    fn find(&self, name: &str, kind_hint: &ArtifactKind) -> Option<PersistedArtifact> {
        let layout = || self.find_layout(name).cloned().map(PersistedArtifact::Layout);
        let config = || self.find_config(name).cloned().map(PersistedArtifact::Config);
        if kind_hint.is_layout() {
            layout().or_else(config)
        } else {
            config().or_else(layout)
        }
    }

    fn has_template_kind(&self, name: &str) -> bool {
        self.template_kinds.contains(name)
    }

    fn create(&mut self, draft: ArtifactDraft) -> StoreResult<PersistedArtifact> {
        self.validate(&draft, None)?;
        let id = self.allocate_id();

        let created = match draft {
            ArtifactDraft::Layout {
                name,
                layout_text,
                os_family,
            } => {
                let record = LayoutRecord {
                    id,
                    name,
                    layout_text,
                    os_family,
                };
                self.layouts.push(record.clone());
                PersistedArtifact::Layout(record)
            }
            ArtifactDraft::Config {
                name,
                template_text,
                snippet,
                kind_name,
                os_ids,
            } => {
                let record = ConfigRecord {
                    id,
                    name,
                    template_text,
                    snippet,
                    kind_name: if snippet { None } else { kind_name },
                    os_ids,
                };
                self.configs.push(record.clone());
                PersistedArtifact::Config(record)
            }
        };
        Ok(created)
    }

    fn update(
        &mut self,
        existing: &PersistedArtifact,
        draft: ArtifactDraft,
    ) -> StoreResult<PersistedArtifact> {
        if existing.is_layout() != draft.is_layout() {
            return Err(StoreError::Invalid {
                name: existing.name().to_string(),
                message: format!(
                    "cannot turn a {} into a {}",
                    existing.kind_label(),
                    if draft.is_layout() { "ptable" } else { "template" }
                ),
            });
        }
        self.validate(&draft, Some(existing.id()))?;

        let not_found = || StoreError::NotFound {
            name: existing.name().to_string(),
            kind: existing.kind_label(),
        };

        match draft {
            ArtifactDraft::Layout {
                name,
                layout_text,
                os_family,
            } => {
                let record = self
                    .layouts
                    .iter_mut()
                    .find(|l| l.id == existing.id())
                    .ok_or_else(not_found)?;
                record.name = name;
                record.layout_text = layout_text;
                record.os_family = os_family;
                Ok(PersistedArtifact::Layout(record.clone()))
            }
            ArtifactDraft::Config {
                name,
                template_text,
                snippet,
                kind_name,
                os_ids,
            } => {
                let record = self
                    .configs
                    .iter_mut()
                    .find(|c| c.id == existing.id())
                    .ok_or_else(not_found)?;
                record.name = name;
                record.template_text = template_text;
                record.snippet = snippet;
                record.kind_name = if snippet { None } else { kind_name };
                record.os_ids = os_ids;
                Ok(PersistedArtifact::Config(record.clone()))
            }
        }
    }

    fn delete(&mut self, existing: &PersistedArtifact) -> StoreResult<()> {
        let before = self.len();
        match existing {
            PersistedArtifact::Layout(layout) => self.layouts.retain(|l| l.id != layout.id),
            PersistedArtifact::Config(config) => self.configs.retain(|c| c.id != config.id),
        }
        if self.len() == before {
            return Err(StoreError::NotFound {
                name: existing.name().to_string(),
                kind: existing.kind_label(),
            });
        }
        Ok(())
    }
}
