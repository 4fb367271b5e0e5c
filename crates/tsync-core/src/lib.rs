//! Template reconciliation engine
//!
//! Compares template artifacts from an external source against artifacts
//! persisted in a store and applies an approved subset of the difference:
//!
//! ```text
//!   Fetcher -> ArtifactLoader (MetadataExtractor per file) -> LoadedSet
//!                                                                |
//!   ArtifactStore::list_all --------------------------> compute_changes -> ChangeSet
//!                                                                |
//!                                      caller approves a subset  v
//!   ArtifactStore <------------------ SyncApplier <--------- ApprovedChanges
//! ```
//!
//! The store is assumed to be used exclusively for the duration of an apply
//! pass; concurrent imports must be serialized by the caller.
//!
//! # Example
//!
//! ```no_run
//! use tsync_core::{ApprovedChanges, ImportConfig, Importer, LocalFetcher, MemoryStore, StaticOsCatalog};
//!
//! let importer = Importer::new(ImportConfig::default().with_source("/srv/templates"));
//! let mut store = MemoryStore::new().with_template_kinds(["provision"]);
//! let catalog = StaticOsCatalog::default();
//!
//! let report = importer.compute_changes(&LocalFetcher, &catalog, &store)?;
//! println!("{}", report.summary());
//!
//! let errors = importer.apply_changes(&mut store, &ApprovedChanges::all(&report.changes));
//! assert!(errors.is_empty());
//! # Ok::<(), tsync_core::Error>(())
//! ```

pub mod apply;
pub mod catalog;
pub mod config;
pub mod diff;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod importer;
pub mod loader;
pub mod logging;
pub mod model;
pub mod store;

pub use apply::{AppliedAction, ApplyError, ApplyReport, ApprovedChanges, SyncApplier};
pub use catalog::{OsCatalog, StaticOsCatalog, resolve_os_family, resolve_os_ids};
pub use config::{DEFAULT_SOURCE_URI, ImportConfig};
pub use diff::{
    ChangeCategory, ChangeSet, ChangedField, DiffEntry, DiffPayload, FieldChange, compute_changes,
};
pub use error::{Error, FetchError, Result, StoreError};
pub use extract::MetadataExtractor;
pub use fetch::{FetchedTree, Fetcher, LocalFetcher};
pub use importer::{ChangeReport, ImportContext, Importer};
pub use loader::{ArtifactLoader, FetchStatus, LoadedSet, SkippedArtifact};
pub use model::{
    ArtifactDraft, ArtifactKind, ArtifactMetadata, ConfigRecord, LayoutRecord, OsEntry,
    PersistedArtifact, RawArtifact,
};
pub use store::{ArtifactStore, MemoryStore, StoreResult};
