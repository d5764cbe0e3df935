//! Per (namespace, type) cache of merged resource maps.
//!
//! A slot holds the merged collection for one (namespace, type) pair and the
//! set of leaves whose content changed since the slot was last brought up to
//! date. Instead of rebuilding the slot, a query reconciles only those leaves:
//! their previous items are removed by name and their current items are
//! inserted again. The slot's snapshot is then patched for the names those
//! leaves touched.
//!
//! Merged snapshots list names alphabetically. Within a name, folded types
//! list one item per configuration in configuration order; duplicate types
//! list every item in leaf priority order.
//!
//! Namespaces served by a single leaf bypass the cache entirely and hand out
//! the leaf's own map.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexSet;
use log::debug;

use crate::multimap::ResourceMultimap;
use crate::per_config::PerConfigResourceMap;
use crate::priority::ResourceItemComparator;
use crate::repository::SingleNamespaceRepository;
use crate::resource::{RepositoryId, ResourceItem, ResourceNamespace, ResourceType};

/// Counters describing how queries were answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Slots built from scratch.
    pub full_merges: u64,
    /// Leaves reconciled into an existing slot.
    pub reconciliations: u64,
    /// Queries answered from a consistent slot.
    pub hits: u64,
    /// Names rewritten in cached snapshots by reconciliation.
    pub patched_names: u64,
}

/// Merged collection of a slot.
///
/// Types that allow duplicate definitions keep every item; all other types
/// fold items of the same configuration by priority.
#[derive(Debug, Clone)]
pub enum MergedMap {
    PerConfig(PerConfigResourceMap),
    Plain(ResourceMultimap),
}

impl MergedMap {
    pub fn new(resource_type: ResourceType, comparator: Arc<ResourceItemComparator>) -> Self {
        if resource_type.allows_duplicates() {
            MergedMap::Plain(ResourceMultimap::new())
        } else {
            MergedMap::PerConfig(PerConfigResourceMap::new(comparator))
        }
    }

    pub fn put_map(&mut self, other: &ResourceMultimap) {
        match self {
            MergedMap::PerConfig(map) => {
                map.put_map(other);
            }
            MergedMap::Plain(map) => map.put_map(other),
        }
    }

    /// Removes the items of `name` provided by `repository`.
    pub fn remove_from(&mut self, name: &str, repository: RepositoryId) -> bool {
        match self {
            MergedMap::PerConfig(map) => map.remove_if(name, |item| item.repository == repository),
            MergedMap::Plain(map) => map.remove_if(name, |item| item.repository == repository),
        }
    }

    /// Visible items of `name`.
    pub fn visible(&self, name: &str) -> Vec<Arc<ResourceItem>> {
        match self {
            MergedMap::PerConfig(map) => map.get(name).cloned().collect(),
            MergedMap::Plain(map) => map.get(name).to_vec(),
        }
    }

    /// Puts the items of `name` back in leaf priority order after a leaf's
    /// items were appended out of turn.
    fn restore_priority_order(&mut self, name: &str, comparator: &ResourceItemComparator) {
        if let MergedMap::Plain(map) = self {
            map.sort_values_by(name, |a, b| comparator.priority().compare(a, b));
        }
    }

    /// Number of visible items.
    pub fn len(&self) -> usize {
        match self {
            MergedMap::PerConfig(map) => map.len(),
            MergedMap::Plain(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the visible items with names in sorted order.
    pub fn to_multimap(&self) -> ResourceMultimap {
        let mut result = match self {
            MergedMap::PerConfig(map) => map.to_multimap(),
            MergedMap::Plain(map) => map.clone(),
        };
        result.sort_names();
        result
    }
}

#[derive(Debug)]
struct MergedSlot {
    map: MergedMap,
    unreconciled: IndexSet<RepositoryId>,
    /// Visible items of `map`, kept in step with it.
    snapshot: Arc<ResourceMultimap>,
}

/// Merged maps of one composite.
#[derive(Debug, Default)]
pub struct MergeCache {
    slots: HashMap<(ResourceNamespace, ResourceType), MergedSlot>,
    /// Names each leaf contributed per type at its last merge.
    resource_names: HashMap<(RepositoryId, ResourceType), HashSet<String>>,
    stats: MergeStats,
}

impl MergeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items of `resource_type` in `namespace` merged from `leaves`, which
    /// must be the namespace's leaves in priority order.
    pub fn get_map(
        &mut self,
        namespace: &ResourceNamespace,
        resource_type: ResourceType,
        leaves: &[Arc<dyn SingleNamespaceRepository>],
        comparator: &Arc<ResourceItemComparator>,
    ) -> Arc<ResourceMultimap> {
        match leaves {
            [] => return Arc::new(ResourceMultimap::new()),
            [leaf] => return leaf.resources(namespace, resource_type),
            _ => {}
        }

        let key = (namespace.clone(), resource_type);
        if let Some(slot) = self.slots.get_mut(&key) {
            if slot.unreconciled.is_empty() {
                self.stats.hits += 1;
            } else {
                let unreconciled: Vec<RepositoryId> = slot.unreconciled.drain(..).collect();
                let mut touched = BTreeSet::new();
                for id in unreconciled {
                    let Some(leaf) = leaves.iter().find(|leaf| leaf.id() == id) else {
                        continue;
                    };
                    touched.extend(reconcile(
                        &mut slot.map,
                        &mut self.resource_names,
                        leaf,
                        namespace,
                        resource_type,
                        comparator,
                    ));
                    self.stats.reconciliations += 1;
                }
                // Copies the snapshot only if a reader still holds it.
                let snapshot = Arc::make_mut(&mut slot.snapshot);
                for name in &touched {
                    snapshot.set_sorted(name, slot.map.visible(name));
                }
                self.stats.patched_names += touched.len() as u64;
            }
            if slot.map.is_empty() {
                self.slots.remove(&key);
                return Arc::new(ResourceMultimap::new());
            }
            return slot.snapshot.clone();
        }

        let started = Instant::now();
        let mut map = MergedMap::new(resource_type, comparator.clone());
        for leaf in leaves {
            let contribution = leaf.resources(namespace, resource_type);
            map.put_map(&contribution);
            self.resource_names.insert(
                (leaf.id(), resource_type),
                contribution.keys().cloned().collect(),
            );
        }
        self.stats.full_merges += 1;
        debug!(
            "Merged {} {} items of {} from {} leaves in {:?}",
            map.len(),
            resource_type,
            namespace,
            leaves.len(),
            started.elapsed()
        );

        if map.is_empty() {
            return Arc::new(ResourceMultimap::new());
        }
        let snapshot = Arc::new(map.to_multimap());
        self.slots.insert(
            key,
            MergedSlot {
                map,
                unreconciled: IndexSet::new(),
                snapshot: snapshot.clone(),
            },
        );
        snapshot
    }

    /// Marks `leaf` as changed in the existing slots of `namespace` for
    /// `types`. Returns the number of slots marked.
    pub fn mark_unreconciled(
        &mut self,
        namespace: &ResourceNamespace,
        leaf: RepositoryId,
        types: &[ResourceType],
    ) -> usize {
        let mut marked = 0;
        for resource_type in types {
            if let Some(slot) = self.slots.get_mut(&(namespace.clone(), *resource_type)) {
                slot.unreconciled.insert(leaf);
                marked += 1;
            }
        }
        marked
    }

    /// Whether `leaf` is waiting to be reconciled into the given slot.
    pub fn is_unreconciled(
        &self,
        namespace: &ResourceNamespace,
        resource_type: ResourceType,
        leaf: RepositoryId,
    ) -> bool {
        self.slots
            .get(&(namespace.clone(), resource_type))
            .is_some_and(|slot| slot.unreconciled.contains(&leaf))
    }

    /// Number of cached slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    /// Drops every slot and recorded name set.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.resource_names.clear();
    }
}

/// Replaces the items of `leaf` in `map`. Returns the names the leaf
/// provided before or provides now.
fn reconcile(
    map: &mut MergedMap,
    resource_names: &mut HashMap<(RepositoryId, ResourceType), HashSet<String>>,
    leaf: &Arc<dyn SingleNamespaceRepository>,
    namespace: &ResourceNamespace,
    resource_type: ResourceType,
    comparator: &ResourceItemComparator,
) -> BTreeSet<String> {
    let id = leaf.id();
    let mut touched = BTreeSet::new();
    if let Some(names) = resource_names.remove(&(id, resource_type)) {
        for name in &names {
            map.remove_from(name, id);
        }
        touched.extend(names);
    }
    let contribution = leaf.resources(namespace, resource_type);
    map.put_map(&contribution);
    let names: HashSet<String> = contribution.keys().cloned().collect();
    for name in &names {
        map.restore_priority_order(name, comparator);
    }
    touched.extend(names.iter().cloned());
    resource_names.insert((id, resource_type), names);
    touched
}
