//! Property-based tests for merging.
//!
//! These tests use proptest to generate random leaf contents and edit
//! sequences and verify that invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use std::sync::Arc;

    use crate::memory::MemoryResourceRepository;
    use crate::multi::MultiResourceRepository;
    use crate::multimap::ResourceMultimap;
    use crate::per_config::PerConfigResourceMap;
    use crate::priority::{ResourceItemComparator, ResourcePriorityComparator};
    use crate::repository::{ItemMapLock, SingleNamespaceRepository};
    use crate::resource::{
        FolderConfiguration, RepositoryId, ResourceItem, ResourceNamespace, ResourceType,
    };
    use proptest::prelude::*;

    const NAMES: [&str; 4] = ["title", "label", "hint", "action"];
    const CONFIGS: [&str; 3] = ["default", "fr", "night"];

    /// (leaf, name, configuration, value)
    type Definition = (usize, usize, usize, u8);

    #[derive(Debug, Clone)]
    enum Edit {
        Add(Definition),
        Remove(usize, usize, usize),
    }

    fn definition() -> impl Strategy<Value = Definition> {
        (0..3usize, 0..NAMES.len(), 0..CONFIGS.len(), any::<u8>())
    }

    fn edit() -> impl Strategy<Value = Edit> {
        prop_oneof![
            definition().prop_map(Edit::Add),
            (0..3usize, 0..NAMES.len(), 0..CONFIGS.len())
                .prop_map(|(leaf, name, config)| Edit::Remove(leaf, name, config)),
        ]
    }

    fn configuration(index: usize) -> FolderConfiguration {
        CONFIGS[index].parse().unwrap()
    }

    fn tree(
        definitions: &[Definition],
    ) -> (Arc<MultiResourceRepository>, Vec<Arc<MemoryResourceRepository>>) {
        tree_of(ResourceType::String, definitions)
    }

    fn tree_of(
        resource_type: ResourceType,
        definitions: &[Definition],
    ) -> (Arc<MultiResourceRepository>, Vec<Arc<MemoryResourceRepository>>) {
        let lock = ItemMapLock::new();
        let leaves: Vec<_> = (0..3)
            .map(|index| {
                MemoryResourceRepository::with_lock(
                    format!("leaf{}", index),
                    ResourceNamespace::res_auto(),
                    &lock,
                )
            })
            .collect();
        for (leaf, name, config, value) in definitions {
            apply(
                &leaves,
                resource_type,
                &Edit::Add((*leaf, *name, *config, *value)),
            );
        }
        let root = MultiResourceRepository::with_lock("root", &lock);
        root.set_children(
            leaves.iter().map(|leaf| leaf.clone().into()).collect(),
            vec![],
            vec![],
        )
        .unwrap();
        (root, leaves)
    }

    /// Adding replaces the leaf's previous definition for the same
    /// (name, configuration).
    fn apply(
        leaves: &[Arc<MemoryResourceRepository>],
        resource_type: ResourceType,
        edit: &Edit,
    ) {
        match edit {
            Edit::Add((leaf, name, config, value)) => {
                let leaf = &leaves[*leaf];
                leaf.remove_resource(resource_type, NAMES[*name], &configuration(*config));
                leaf.add_item(
                    leaf.new_item(resource_type, NAMES[*name], configuration(*config))
                        .with_value(value.to_string()),
                );
            }
            Edit::Remove(leaf, name, config) => {
                leaves[*leaf].remove_resource(
                    resource_type,
                    NAMES[*name],
                    &configuration(*config),
                );
            }
        }
    }

    /// (name, configuration, value) in the order the map lists them.
    fn listed(map: &ResourceMultimap) -> Vec<(String, String, Option<String>)> {
        map.values()
            .map(|item| {
                (
                    item.name.clone(),
                    item.configuration.to_string(),
                    item.value.clone(),
                )
            })
            .collect()
    }

    fn contents(map: &ResourceMultimap) -> Vec<(String, String, Option<String>)> {
        let mut contents = listed(map);
        contents.sort();
        contents
    }

    fn strings(root: &MultiResourceRepository) -> Arc<ResourceMultimap> {
        root.get_map(&ResourceNamespace::res_auto(), ResourceType::String)
    }

    fn ids(root: &MultiResourceRepository) -> Arc<ResourceMultimap> {
        root.get_map(&ResourceNamespace::res_auto(), ResourceType::Id)
    }

    // ============================================================================
    // Merge cache property tests
    // ============================================================================

    proptest! {
        /// Property: reconciling edits into a cached map gives the same result
        /// as merging from scratch
        #[test]
        fn incremental_merge_matches_full_merge(
            initial in prop::collection::vec(definition(), 0..12),
            edits in prop::collection::vec(edit(), 1..12),
        ) {
            let (root, leaves) = tree(&initial);
            strings(&root);
            for edit in &edits {
                apply(&leaves, ResourceType::String, edit);
                strings(&root);
            }
            let incremental = strings(&root);

            root.invalidate_cache();
            let full = strings(&root);
            prop_assert_eq!(listed(&incremental), listed(&full));
        }

        /// Property: for types keeping every definition, reconciling edits
        /// lists the items in the same order as merging from scratch
        #[test]
        fn incremental_duplicates_match_full_merge(
            initial in prop::collection::vec(definition(), 0..12),
            edits in prop::collection::vec(edit(), 1..12),
        ) {
            let (root, leaves) = tree_of(ResourceType::Id, &initial);
            ids(&root);
            for edit in &edits {
                apply(&leaves, ResourceType::Id, edit);
                ids(&root);
            }
            let incremental = ids(&root);

            root.invalidate_cache();
            let full = ids(&root);
            prop_assert_eq!(listed(&incremental), listed(&full));
        }

        /// Property: the visible item of a (name, configuration) comes from
        /// the first leaf defining it
        #[test]
        fn earliest_leaf_wins(definitions in prop::collection::vec(definition(), 1..16)) {
            let (root, leaves) = tree(&definitions);
            let merged = strings(&root);

            for name in NAMES {
                for (config_index, config) in CONFIGS.iter().enumerate() {
                    let expected = leaves.iter().find_map(|leaf| {
                        leaf.resources(&ResourceNamespace::res_auto(), ResourceType::String)
                            .get(name)
                            .iter()
                            .find(|item| item.configuration == configuration(config_index))
                            .and_then(|item| item.value.clone())
                    });
                    let visible: Vec<_> = merged
                        .get(name)
                        .iter()
                        .filter(|item| item.configuration.to_string() == *config)
                        .map(|item| item.value.clone())
                        .collect();
                    match expected {
                        Some(value) => prop_assert_eq!(visible, vec![Some(value)]),
                        None => prop_assert!(visible.is_empty()),
                    }
                }
            }
        }

        /// Property: repeated queries without edits return the same snapshot
        #[test]
        fn queries_are_deterministic(definitions in prop::collection::vec(definition(), 0..12)) {
            let (root, _leaves) = tree(&definitions);
            let first = strings(&root);
            let second = strings(&root);
            prop_assert_eq!(contents(&first), contents(&second));
        }
    }

    // ============================================================================
    // PerConfigResourceMap property tests
    // ============================================================================

    proptest! {
        /// Property: the visible items do not depend on insertion order
        #[test]
        fn per_config_map_is_order_independent(
            definitions in prop::collection::vec(definition(), 1..16),
            seed in any::<u64>(),
        ) {
            let repositories: Vec<RepositoryId> = (0..3).map(|_| RepositoryId::next()).collect();
            let comparator = Arc::new(ResourceItemComparator::new(
                ResourcePriorityComparator::new(repositories.iter().copied()),
            ));
            let items: Vec<Arc<ResourceItem>> = definitions
                .iter()
                .map(|(leaf, name, config, value)| {
                    Arc::new(
                        ResourceItem::new(
                            repositories[*leaf],
                            ResourceNamespace::res_auto(),
                            ResourceType::String,
                            NAMES[*name],
                            configuration(*config),
                        )
                        .with_value(value.to_string()),
                    )
                })
                .collect();

            let mut forward = PerConfigResourceMap::new(comparator.clone());
            for item in &items {
                forward.put(&item.name, item.clone());
            }
            let mut shuffled_items = items.clone();
            let len = shuffled_items.len();
            shuffled_items.rotate_left((seed as usize) % len);
            shuffled_items.reverse();
            let mut shuffled = PerConfigResourceMap::new(comparator);
            for item in shuffled_items {
                shuffled.put(&item.name.clone(), item);
            }

            let mut forward_items: Vec<_> = forward
                .values()
                .map(|item| (item.name.clone(), item.configuration.to_string(), item.repository))
                .collect();
            let mut shuffled_visible: Vec<_> = shuffled
                .values()
                .map(|item| (item.name.clone(), item.configuration.to_string(), item.repository))
                .collect();
            forward_items.sort();
            shuffled_visible.sort();
            prop_assert_eq!(forward.len(), shuffled.len());
            prop_assert_eq!(forward_items, shuffled_visible);
        }
    }
}
