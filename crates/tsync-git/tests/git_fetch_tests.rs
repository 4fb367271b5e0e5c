//! GitFetcher tests against local repositories (no network)

use pretty_assertions::assert_eq;
use tsync_core::{
    ApprovedChanges, FetchStatus, Fetcher, ImportConfig, Importer, MemoryStore,
};
use tsync_git::GitFetcher;
use tsync_test_utils::git::{checkout, checkout_new_branch, commit_all, tag};
use tsync_test_utils::{TemplateTree, sample_catalog};

fn template_repo() -> TemplateTree {
    let tree = TemplateTree::new()
        .snippet("motd", "hello\n")
        .template("provision", "Kickstart default", &["CentOS"], "install\n");
    commit_all(tree.path(), "Add templates");
    tree
}

#[test]
fn test_clone_checkout_is_removed_after_drop() {
    let repo = template_repo();

    let tree = GitFetcher::new().fetch(&repo.uri(), None).unwrap();
    let root = tree.root().to_path_buf();
    assert!(root.join("snippets/motd.erb").exists());

    drop(tree);
    assert!(!root.exists());
}

#[test]
fn test_import_from_git_repository() {
    let repo = template_repo();
    let importer = Importer::new(ImportConfig::default().with_source(repo.uri()));
    let mut store = MemoryStore::new().with_template_kinds(["provision"]);

    let report = importer
        .compute_changes(&GitFetcher::new(), &sample_catalog(), &store)
        .unwrap();
    assert_eq!(report.fetch, FetchStatus::Succeeded);
    assert_eq!(
        report.changes.new.keys().collect::<Vec<_>>(),
        vec!["Kickstart default", "motd"]
    );

    let errors = importer.apply_changes(&mut store, &ApprovedChanges::all(&report.changes));
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_ref_selects_branch() {
    let repo = template_repo();
    checkout_new_branch(repo.path(), "develop");
    let repo = repo.snippet("banner", "welcome\n");
    commit_all(repo.path(), "Add banner");
    checkout(repo.path(), "main");

    let on_main = Importer::new(ImportConfig::default().with_source(repo.uri()))
        .compute_changes(&GitFetcher::new(), &sample_catalog(), &MemoryStore::new())
        .unwrap();
    assert!(!on_main.changes.new.contains_key("banner"));

    let config = ImportConfig {
        git_ref: Some("develop".to_string()),
        ..ImportConfig::default().with_source(repo.uri())
    };
    let on_develop = Importer::new(config)
        .compute_changes(&GitFetcher::new(), &sample_catalog(), &MemoryStore::new())
        .unwrap();
    assert!(on_develop.changes.new.contains_key("banner"));
}

#[test]
fn test_unreachable_repository_degrades_to_failed_fetch() {
    let importer = Importer::new(ImportConfig::default().with_source("/no/such/repo.git"));

    let report = importer
        .compute_changes(&GitFetcher::new(), &sample_catalog(), &MemoryStore::new())
        .unwrap();

    assert!(!report.fetch.is_success());
    assert!(report.changes.is_empty());
}

#[test]
fn test_ref_selects_tag() {
    let repo = template_repo();
    tag(repo.path(), "v1.0");
    let repo = repo.snippet("banner", "welcome\n");
    commit_all(repo.path(), "Add banner");

    let tree = GitFetcher::new().fetch(&repo.uri(), Some("v1.0")).unwrap();
    assert!(tree.root().join("snippets/motd.erb").exists());
    assert!(!tree.root().join("snippets/banner.erb").exists());

    let config = ImportConfig {
        git_ref: Some("v1.0".to_string()),
        ..ImportConfig::default().with_source(repo.uri())
    };
    let report = Importer::new(config)
        .compute_changes(&GitFetcher::new(), &sample_catalog(), &MemoryStore::new())
        .unwrap();
    assert!(report.fetch.is_success());
    assert_eq!(
        report.changes.new.keys().collect::<Vec<_>>(),
        vec!["Kickstart default", "motd"]
    );
}

#[test]
fn test_unknown_ref_degrades_to_failed_fetch() {
    let repo = template_repo();
    let config = ImportConfig {
        git_ref: Some("no-such-ref".to_string()),
        ..ImportConfig::default().with_source(repo.uri())
    };

    let report = Importer::new(config)
        .compute_changes(&GitFetcher::new(), &sample_catalog(), &MemoryStore::new())
        .unwrap();

    assert!(matches!(
        &report.fetch,
        FetchStatus::Failed { reason } if reason.contains("no-such-ref")
    ));
}

#[test]
fn test_verbose_fetch_checks_out_same_tree() {
    let repo = template_repo();
    let config = ImportConfig {
        verbose: true,
        ..ImportConfig::default().with_source(repo.uri())
    };

    let tree = GitFetcher::from_config(&config)
        .fetch(&config.source_uri, config.git_ref())
        .unwrap();

    assert!(tree.root().join("snippets/motd.erb").exists());
    assert!(tree.root().join("provision/kickstart_default.erb").exists());
}
