//! OS catalog collaborator and OS reference resolution

use std::collections::BTreeSet;

use crate::model::OsEntry;

/// Source of the operating systems templates may be associated with
pub trait OsCatalog {
    fn list_os(&self) -> Vec<OsEntry>;
}

/// Fixed, in-memory OS catalog
#[derive(Debug, Clone, Default)]
pub struct StaticOsCatalog {
    entries: Vec<OsEntry>,
}

impl StaticOsCatalog {
    pub fn new(entries: Vec<OsEntry>) -> Self {
        Self { entries }
    }
}

impl OsCatalog for StaticOsCatalog {
    fn list_os(&self) -> Vec<OsEntry> {
        self.entries.clone()
    }
}

/// Resolve OS label patterns to catalog ids.
///
/// A pattern matches every entry whose label starts with it, ignoring case.
/// Matches of all patterns are unioned.
pub fn resolve_os_ids(catalog: &[OsEntry], patterns: &[String]) -> BTreeSet<u64> {
    let mut ids = BTreeSet::new();
    for pattern in patterns {
        let pattern = pattern.trim().to_lowercase();
        if pattern.is_empty() {
            continue;
        }
        ids.extend(
            catalog
                .iter()
                .filter(|os| os.label.to_lowercase().starts_with(&pattern))
                .map(|os| os.id),
        );
    }
    ids
}

/// Family shared by the given OS ids.
///
/// Ids are visited in ascending order and the first known family wins, so a
/// set spanning several families resolves to the family of its lowest id.
pub fn resolve_os_family(catalog: &[OsEntry], ids: &BTreeSet<u64>) -> Option<String> {
    let mut families = ids.iter().filter_map(|id| {
        catalog
            .iter()
            .find(|os| os.id == *id)
            .and_then(|os| os.family.clone())
    });
    let family = families.next()?;
    if families.any(|other| other != family) {
        tracing::debug!(family = %family, "OS ids span several families, keeping lowest id's");
    }
    Some(family)
}
