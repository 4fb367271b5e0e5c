//! [`TemplateTree`] builder for template source directories.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary template source directory.
///
/// # Example
///
/// ```rust,no_run
/// use tsync_test_utils::TemplateTree;
///
/// let tree = TemplateTree::new()
///     .snippet("motd", "hello")
///     .template("provision", "Kickstart default", &["CentOS"], "install");
/// assert!(tree.path().join("snippets/motd.erb").exists());
/// ```
pub struct TemplateTree {
    temp_dir: TempDir,
}

impl Default for TemplateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateTree {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path as a source URI for fetchers.
    pub fn uri(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }

    /// Write `content` at `relative`, creating parent directories.
    pub fn file(self, relative: &str, content: &str) -> Self {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("TemplateTree: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TemplateTree: failed to write {}: {e}", path.display()));
        self
    }

    /// Add `snippets/<name>.erb` with a `kind: snippet` header.
    pub fn snippet(self, name: &str, body: &str) -> Self {
        let relative = format!("snippets/{name}.erb");
        self.file(&relative, &header(name, "snippet", &[], body))
    }

    /// Add `<kind>/<name>.erb` with a header listing `oses`.
    pub fn template(self, kind: &str, name: &str, oses: &[&str], body: &str) -> Self {
        let relative = format!("{kind}/{}.erb", file_stem(name));
        self.file(&relative, &header(name, kind, oses, body))
    }

    /// Add `partition_tables_templates/<name>.erb` with a `kind: ptable` header.
    pub fn ptable(self, name: &str, oses: &[&str], body: &str) -> Self {
        let relative = format!("partition_tables_templates/{}.erb", file_stem(name));
        self.file(&relative, &header(name, "ptable", oses, body))
    }

    /// Full path of a file in the tree.
    pub fn join(&self, relative: &str) -> PathBuf {
        self.path().join(relative)
    }
}

/// Template text with a YAML metadata header.
pub fn header(name: &str, kind: &str, oses: &[&str], body: &str) -> String {
    let mut text = format!("<%#\nkind: {kind}\nname: {name}\n");
    if !oses.is_empty() {
        text.push_str("oses:\n");
        for os in oses {
            text.push_str(&format!("- {os}\n"));
        }
    }
    text.push_str("%>\n");
    text.push_str(body);
    text
}

fn file_stem(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}
