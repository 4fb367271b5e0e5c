//! Shared test utilities for the template-sync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`] — [`TemplateTree`] builder for template directories on disk
//! - [`git`] — git repositories holding template trees
//! - [`catalog`] — sample OS catalogs

pub mod catalog;
pub mod git;
pub mod tree;

pub use catalog::sample_catalog;
pub use tree::TemplateTree;
