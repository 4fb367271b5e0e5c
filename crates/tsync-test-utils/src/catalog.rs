//! Sample OS catalogs.

use tsync_core::{OsEntry, StaticOsCatalog};

/// Catalog with Redhat and Debian family entries, ids 1-5.
///
/// | id | label           | family |
/// |----|-----------------|--------|
/// | 1  | CentOS 7.9      | Redhat |
/// | 2  | CentOS Stream 9 | Redhat |
/// | 3  | Fedora 39       | Redhat |
/// | 4  | Debian 12       | Debian |
/// | 5  | Ubuntu 22.04    | Debian |
pub fn sample_catalog() -> StaticOsCatalog {
    StaticOsCatalog::new(vec![
        OsEntry::new(1, "CentOS 7.9", Some("Redhat")),
        OsEntry::new(2, "CentOS Stream 9", Some("Redhat")),
        OsEntry::new(3, "Fedora 39", Some("Redhat")),
        OsEntry::new(4, "Debian 12", Some("Debian")),
        OsEntry::new(5, "Ubuntu 22.04", Some("Debian")),
    ])
}
