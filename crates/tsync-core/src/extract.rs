//! Metadata extraction from template headers
//!
//! Templates carry their metadata in the first ERB comment of the file:
//!
//! ```text
//! <%#
//! kind: provision
//! name: Kickstart default
//! oses:
//! - CentOS
//! - Fedora
//! %>
//! ```
//!
//! The comment body is YAML. Files without such a comment are not templates
//! and are skipped; a comment that is not valid YAML is an error for that
//! file only.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::catalog::{resolve_os_family, resolve_os_ids};
use crate::model::{ArtifactKind, ArtifactMetadata, OsEntry, RawArtifact};
use crate::{Error, Result};

/// First `<%# ... %>` comment, `-%>` trim form included
static HEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<%#(.+?).-?%>").unwrap());

/// Directory names that imply a kind when the header declares none
const SNIPPET_DIRS: &[&str] = &["snippet", "snippets"];
const PTABLE_DIRS: &[&str] = &["ptable", "ptables", "partition_tables_templates"];

#[derive(Debug, Default, Deserialize)]
struct Header {
    name: Option<String>,
    kind: Option<String>,
    oses: Option<Vec<String>>,
}

/// Parses raw artifacts into [`ArtifactMetadata`]
#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor {
    prefix: Option<String>,
    catalog: Vec<OsEntry>,
}

impl MetadataExtractor {
    /// Create an extractor resolving OS references against `catalog`
    pub fn new(catalog: Vec<OsEntry>) -> Self {
        Self {
            prefix: None,
            catalog,
        }
    }

    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
        self
    }

    /// Extract metadata from one artifact.
    ///
    /// `raw.path` is expected to be relative to the fetched tree root; its
    /// parent directory is used to derive the kind when the header has none.
    ///
    /// Returns `Ok(None)` when the file has no header comment.
    pub fn extract(&self, raw: &RawArtifact) -> Result<Option<ArtifactMetadata>> {
        let Some(block) = header_block(&raw.content) else {
            return Ok(None);
        };
        let header = parse_header(block, &raw.path)?;

        let name = match header.name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => file_title(&raw.path),
        };
        let name = match &self.prefix {
            Some(prefix) => format!("{} {}", prefix, name),
            None => name,
        };

        let kind = match header.kind.filter(|k| !k.trim().is_empty()) {
            Some(kind) => ArtifactKind::from(kind.trim()),
            None => kind_from_location(&raw.path).ok_or_else(|| Error::MissingKind {
                path: raw.path.clone(),
            })?,
        };

        let os_refs = header.oses.unwrap_or_default();
        let os_ids = resolve_os_ids(&self.catalog, &os_refs);
        let os_family = resolve_os_family(&self.catalog, &os_ids);

        Ok(Some(ArtifactMetadata {
            name,
            kind,
            os_refs,
            os_ids,
            os_family,
            body: raw.content.clone(),
            source: raw.path.clone(),
        }))
    }
}

/// Text of the first header comment, if any
pub fn header_block(content: &str) -> Option<&str> {
    HEADER_PATTERN
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse_header(block: &str, path: &Path) -> Result<Header> {
    let malformed = |message: String| Error::MalformedHeader {
        path: path.to_path_buf(),
        message,
    };

    let value: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|e| malformed(e.to_string()))?;
    match value {
        serde_yaml::Value::Null => Ok(Header::default()),
        serde_yaml::Value::Mapping(_) => {
            serde_yaml::from_value(value).map_err(|e| malformed(e.to_string()))
        }
        _ => Err(malformed("header is not a key/value mapping".to_string())),
    }
}

/// File name up to its first dot: `kickstart.erb` -> `kickstart`
fn file_title(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.split_once('.') {
        Some((title, _)) => title.to_string(),
        None => file_name,
    }
}

fn kind_from_location(path: &Path) -> Option<ArtifactKind> {
    let dir = path
        .parent()?
        .file_name()?
        .to_string_lossy()
        .into_owned();

    if SNIPPET_DIRS.contains(&dir.as_str()) {
        Some(ArtifactKind::Snippet)
    } else if PTABLE_DIRS.contains(&dir.as_str()) {
        Some(ArtifactKind::Ptable)
    } else {
        Some(ArtifactKind::Template(dir))
    }
}
