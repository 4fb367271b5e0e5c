//! Git source for the template reconciliation engine
//!
//! Provides [`GitFetcher`], a [`tsync_core::Fetcher`] that clones the template
//! repository into a temporary directory for the duration of a load.

pub mod error;
pub mod fetcher;

pub use error::{Error, Result};
pub use fetcher::{GitFetcher, clone_repo};
