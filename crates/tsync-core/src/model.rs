//! Artifact data model
//!
//! Two worlds meet here: artifacts loaded from a template source
//! ([`RawArtifact`] -> [`ArtifactMetadata`]) and artifacts already persisted in
//! a store ([`PersistedArtifact`]). [`ArtifactDraft`] is the field set used to
//! write the latter from the former.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Label used for snippet artifacts
pub const SNIPPET_KIND: &str = "snippet";

/// Label used for partition table (layout) artifacts
pub const PTABLE_KIND: &str = "ptable";

/// Kind of a template artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ArtifactKind {
    /// Reusable configuration snippet
    Snippet,
    /// OS installation layout (partition table)
    Ptable,
    /// Named template kind, e.g. `provision` or `PXELinux`
    Template(String),
}

impl ArtifactKind {
    pub fn label(&self) -> &str {
        match self {
            ArtifactKind::Snippet => SNIPPET_KIND,
            ArtifactKind::Ptable => PTABLE_KIND,
            ArtifactKind::Template(name) => name,
        }
    }

    pub fn is_layout(&self) -> bool {
        matches!(self, ArtifactKind::Ptable)
    }

    pub fn is_snippet(&self) -> bool {
        matches!(self, ArtifactKind::Snippet)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for ArtifactKind {
    fn from(label: &str) -> Self {
        match label {
            SNIPPET_KIND => ArtifactKind::Snippet,
            PTABLE_KIND => ArtifactKind::Ptable,
            other => ArtifactKind::Template(other.to_string()),
        }
    }
}

impl From<String> for ArtifactKind {
    fn from(label: String) -> Self {
        ArtifactKind::from(label.as_str())
    }
}

impl From<ArtifactKind> for String {
    fn from(kind: ArtifactKind) -> Self {
        kind.label().to_string()
    }
}

impl FromStr for ArtifactKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(ArtifactKind::from(s))
    }
}

/// A file fetched from the template source, before metadata extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArtifact {
    pub path: PathBuf,
    pub content: String,
}

impl RawArtifact {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Read a raw artifact from disk
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::new(path, content))
    }
}

/// Metadata parsed from an artifact's embedded header, plus its full text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Identity key within one run, prefix included
    pub name: String,
    pub kind: ArtifactKind,
    /// OS label patterns as declared in the header
    #[serde(default)]
    pub os_refs: Vec<String>,
    /// Catalog ids matched by `os_refs`
    #[serde(default)]
    pub os_ids: BTreeSet<u64>,
    pub os_family: Option<String>,
    /// Verbatim file content, header included
    pub body: String,
    /// Path the artifact was loaded from
    #[serde(default)]
    pub source: PathBuf,
}

/// An operating system known to the OS catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsEntry {
    pub id: u64,
    /// Human-readable label, e.g. `CentOS 7.9`
    pub label: String,
    pub family: Option<String>,
}

impl OsEntry {
    pub fn new(id: u64, label: impl Into<String>, family: Option<&str>) -> Self {
        Self {
            id,
            label: label.into(),
            family: family.map(str::to_string),
        }
    }
}

/// Persisted OS installation layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub id: u64,
    pub name: String,
    pub layout_text: String,
    pub os_family: Option<String>,
}

/// Persisted configuration template or snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub id: u64,
    pub name: String,
    pub template_text: String,
    pub snippet: bool,
    /// Template kind name, `None` for snippets
    pub kind_name: Option<String>,
    pub os_ids: BTreeSet<u64>,
}

/// An artifact owned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum PersistedArtifact {
    Layout(LayoutRecord),
    Config(ConfigRecord),
}

impl PersistedArtifact {
    pub fn id(&self) -> u64 {
        match self {
            PersistedArtifact::Layout(layout) => layout.id,
            PersistedArtifact::Config(config) => config.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PersistedArtifact::Layout(layout) => &layout.name,
            PersistedArtifact::Config(config) => &config.name,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            PersistedArtifact::Layout(_) => ArtifactKind::Ptable,
            PersistedArtifact::Config(config) if config.snippet => ArtifactKind::Snippet,
            PersistedArtifact::Config(config) => {
                ArtifactKind::Template(config.kind_name.clone().unwrap_or_default())
            }
        }
    }

    /// `"ptable"` for layouts, `"snippet"` or the kind name for config templates
    pub fn kind_label(&self) -> String {
        self.kind().label().to_string()
    }

    pub fn body(&self) -> &str {
        match self {
            PersistedArtifact::Layout(layout) => &layout.layout_text,
            PersistedArtifact::Config(config) => &config.template_text,
        }
    }

    pub fn is_layout(&self) -> bool {
        matches!(self, PersistedArtifact::Layout(_))
    }
}

/// Writable field set for one persisted variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ArtifactDraft {
    Layout {
        name: String,
        layout_text: String,
        os_family: Option<String>,
    },
    Config {
        name: String,
        template_text: String,
        snippet: bool,
        kind_name: Option<String>,
        os_ids: BTreeSet<u64>,
    },
}

impl ArtifactDraft {
    /// Build the variant matching the metadata's kind
    pub fn from_metadata(metadata: &ArtifactMetadata) -> Self {
        match &metadata.kind {
            ArtifactKind::Ptable => ArtifactDraft::Layout {
                name: metadata.name.clone(),
                layout_text: metadata.body.clone(),
                os_family: metadata.os_family.clone(),
            },
            kind => ArtifactDraft::Config {
                name: metadata.name.clone(),
                template_text: metadata.body.clone(),
                snippet: kind.is_snippet(),
                kind_name: match kind {
                    ArtifactKind::Template(name) => Some(name.clone()),
                    _ => None,
                },
                os_ids: metadata.os_ids.clone(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ArtifactDraft::Layout { name, .. } | ArtifactDraft::Config { name, .. } => name,
        }
    }

    pub fn is_layout(&self) -> bool {
        matches!(self, ArtifactDraft::Layout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(kind: ArtifactKind) -> ArtifactMetadata {
        ArtifactMetadata {
            name: "Kickstart default".to_string(),
            kind,
            os_refs: vec!["CentOS".to_string()],
            os_ids: BTreeSet::from([1, 2]),
            os_family: Some("Redhat".to_string()),
            body: "<%#\nkind: provision\n%>\ninstall".to_string(),
            source: PathBuf::from("provision/kickstart.erb"),
        }
    }

    #[test]
    fn test_kind_labels_parse_back() {
        assert_eq!(ArtifactKind::from("snippet"), ArtifactKind::Snippet);
        assert_eq!(ArtifactKind::from("ptable"), ArtifactKind::Ptable);
        assert_eq!(
            ArtifactKind::from("provision"),
            ArtifactKind::Template("provision".to_string())
        );
        assert_eq!(ArtifactKind::Ptable.to_string(), "ptable");
    }

    #[test]
    fn test_kind_serializes_as_label() {
        let json = serde_json::to_string(&ArtifactKind::Snippet).unwrap();
        assert_eq!(json, "\"snippet\"");
        let kind: ArtifactKind = serde_json::from_str("\"PXELinux\"").unwrap();
        assert_eq!(kind, ArtifactKind::Template("PXELinux".to_string()));
    }

    #[test]
    fn test_persisted_kind_label() {
        let layout = PersistedArtifact::Layout(LayoutRecord {
            id: 1,
            name: "Kickstart default".to_string(),
            layout_text: "zerombr".to_string(),
            os_family: None,
        });
        let snippet = PersistedArtifact::Config(ConfigRecord {
            id: 2,
            name: "motd".to_string(),
            template_text: "hello".to_string(),
            snippet: true,
            kind_name: None,
            os_ids: BTreeSet::new(),
        });
        let provision = PersistedArtifact::Config(ConfigRecord {
            id: 3,
            name: "Kickstart".to_string(),
            template_text: "install".to_string(),
            snippet: false,
            kind_name: Some("provision".to_string()),
            os_ids: BTreeSet::new(),
        });

        assert_eq!(layout.kind_label(), "ptable");
        assert_eq!(snippet.kind_label(), "snippet");
        assert_eq!(provision.kind_label(), "provision");
        assert_eq!(snippet.body(), "hello");
    }

    #[test]
    fn test_draft_from_ptable_metadata_is_layout() {
        let draft = ArtifactDraft::from_metadata(&metadata(ArtifactKind::Ptable));
        assert_eq!(
            draft,
            ArtifactDraft::Layout {
                name: "Kickstart default".to_string(),
                layout_text: "<%#\nkind: provision\n%>\ninstall".to_string(),
                os_family: Some("Redhat".to_string()),
            }
        );
    }

    #[test]
    fn test_draft_from_snippet_metadata() {
        let draft = ArtifactDraft::from_metadata(&metadata(ArtifactKind::Snippet));
        match draft {
            ArtifactDraft::Config {
                snippet, kind_name, os_ids, ..
            } => {
                assert!(snippet);
                assert_eq!(kind_name, None);
                assert_eq!(os_ids, BTreeSet::from([1, 2]));
            }
            other => panic!("Expected Config draft, got {:?}", other),
        }
    }
}
