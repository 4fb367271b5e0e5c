//! Import configuration
//!
//! Options for one compare-then-apply cycle, loadable from TOML:
//!
//! ```toml
//! source_uri = "https://github.com/theforeman/community-templates.git"
//! git_ref = "develop"
//! name_prefix = "Community"
//! subpath = "/provisioning"
//! name_filter = "kickstart|preseed"
//! ```

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Template repository used when no source is configured
pub const DEFAULT_SOURCE_URI: &str = "https://github.com/theforeman/community-templates.git";

/// Extension of template files in the source tree
pub const DEFAULT_EXTENSION: &str = "erb";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub source_uri: String,
    /// Branch to fetch; the source's default branch when unset
    pub git_ref: Option<String>,
    /// Prepended to every loaded name, separated by a space
    pub name_prefix: Option<String>,
    /// Directory inside the source to load templates from
    pub subpath: String,
    /// Case-insensitive regex matched against resolved names
    pub name_filter: Option<String>,
    pub extension: String,
    pub verbose: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            source_uri: DEFAULT_SOURCE_URI.to_string(),
            git_ref: None,
            name_prefix: None,
            subpath: "/".to_string(),
            name_filter: None,
            extension: DEFAULT_EXTENSION.to_string(),
            verbose: false,
        }
    }
}

impl ImportConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse {
            path: PathBuf::new(),
            format: "TOML".into(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            format: "TOML".into(),
            message: e.to_string(),
        })
    }

    pub fn with_source(mut self, source_uri: impl Into<String>) -> Self {
        self.source_uri = source_uri.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn with_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.subpath = subpath.into();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.name_filter = Some(filter.into());
        self
    }

    /// Branch to fetch, with an empty string meaning "default branch"
    pub fn git_ref(&self) -> Option<&str> {
        self.git_ref.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// Non-empty name prefix
    pub fn name_prefix(&self) -> Option<&str> {
        self.name_prefix.as_deref().filter(|p| !p.is_empty())
    }

    /// Compile the name filter, if any
    pub fn compiled_filter(&self) -> Result<Option<Regex>> {
        let Some(pattern) = self.name_filter.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Some)
            .map_err(|source| Error::InvalidFilter {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Directory to walk below a fetched root
    pub fn load_root(&self, root: &Path) -> PathBuf {
        let relative = self.subpath.trim_matches('/');
        if relative.is_empty() {
            root.to_path_buf()
        } else {
            root.join(relative)
        }
    }
}
