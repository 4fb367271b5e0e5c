use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tsync_core::{
    ArtifactKind, ArtifactMetadata, ConfigRecord, LayoutRecord, PersistedArtifact, compute_changes,
};

fn kind_strategy() -> impl Strategy<Value = ArtifactKind> {
    prop_oneof![
        Just(ArtifactKind::Snippet),
        Just(ArtifactKind::Ptable),
        Just(ArtifactKind::Template("provision".to_string())),
    ]
}

fn loaded_strategy() -> impl Strategy<Value = BTreeMap<String, ArtifactMetadata>> {
    prop::collection::btree_map("[a-e]{1,2}", (kind_strategy(), "[xy]{0,3}"), 0..8).prop_map(
        |entries| {
            entries
                .into_iter()
                .map(|(name, (kind, body))| {
                    let metadata = ArtifactMetadata {
                        name: name.clone(),
                        kind,
                        os_refs: Vec::new(),
                        os_ids: BTreeSet::new(),
                        os_family: None,
                        body,
                        source: PathBuf::new(),
                    };
                    (name, metadata)
                })
                .collect()
        },
    )
}

/// Persisted artifacts, names may repeat across (and within) variants
fn persisted_strategy() -> impl Strategy<Value = Vec<PersistedArtifact>> {
    prop::collection::vec(("[a-e]{1,2}", kind_strategy(), "[xy]{0,3}"), 0..8).prop_map(
        |entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(id, (name, kind, text))| match kind {
                    ArtifactKind::Ptable => PersistedArtifact::Layout(LayoutRecord {
                        id: id as u64,
                        name,
                        layout_text: text,
                        os_family: None,
                    }),
                    kind => PersistedArtifact::Config(ConfigRecord {
                        id: id as u64,
                        name,
                        template_text: text,
                        snippet: kind.is_snippet(),
                        kind_name: match kind {
                            ArtifactKind::Template(name) => Some(name),
                            _ => None,
                        },
                        os_ids: BTreeSet::new(),
                    }),
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn test_every_name_in_exactly_one_category(
        loaded in loaded_strategy(),
        persisted in persisted_strategy(),
    ) {
        let changes = compute_changes(&loaded, &persisted);

        let all_names: BTreeSet<String> = loaded
            .keys()
            .cloned()
            .chain(persisted.iter().map(|a| a.name().to_string()))
            .collect();

        for name in &all_names {
            let memberships = [
                changes.new.contains_key(name),
                changes.obsolete.contains_key(name),
                changes.updated.contains_key(name),
                changes.unchanged.contains(name),
            ];
            prop_assert_eq!(memberships.iter().filter(|m| **m).count(), 1, "name {}", name);
        }
        prop_assert_eq!(changes.len() + changes.unchanged.len(), all_names.len());
    }

    #[test]
    fn test_persisted_order_does_not_change_membership(
        loaded in loaded_strategy(),
        persisted in persisted_strategy(),
    ) {
        let forward = compute_changes(&loaded, &persisted);
        let mut reversed_input = persisted.clone();
        reversed_input.reverse();
        let reversed = compute_changes(&loaded, &reversed_input);

        prop_assert_eq!(forward, reversed);
    }

    #[test]
    fn test_comparing_with_itself_is_empty(loaded in loaded_strategy()) {
        let persisted: Vec<PersistedArtifact> = loaded
            .values()
            .enumerate()
            .map(|(id, m)| match &m.kind {
                ArtifactKind::Ptable => PersistedArtifact::Layout(LayoutRecord {
                    id: id as u64,
                    name: m.name.clone(),
                    layout_text: m.body.clone(),
                    os_family: m.os_family.clone(),
                }),
                kind => PersistedArtifact::Config(ConfigRecord {
                    id: id as u64,
                    name: m.name.clone(),
                    template_text: m.body.clone(),
                    snippet: kind.is_snippet(),
                    kind_name: match kind {
                        ArtifactKind::Template(name) => Some(name.clone()),
                        _ => None,
                    },
                    os_ids: m.os_ids.clone(),
                }),
            })
            .collect();

        let changes = compute_changes(&loaded, &persisted);
        prop_assert!(changes.is_empty());
        prop_assert_eq!(changes.unchanged.len(), loaded.len());
    }
}
