//! In-memory local repository.
//!
//! [`MemoryResourceRepository`] is a mutable single-namespace leaf. Every
//! mutation reports the affected resource types to the composites the leaf
//! is attached to, which then reconcile only this leaf on their next query.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;

use crate::multi::{propagate_invalidation, MultiResourceRepository};
use crate::multimap::ResourceMultimap;
use crate::repository::{
    next_modification_count, ItemMapLock, LocalResourceRepository, ParentLinks,
    SingleNamespaceRepository, UpdatesCallback,
};
use crate::resource::{
    FolderConfiguration, RepositoryId, ResourceItem, ResourceNamespace, ResourceType,
};

#[derive(Default)]
struct PendingUpdates {
    count: usize,
    callbacks: Vec<UpdatesCallback>,
}

/// Mutable leaf repository holding its items in memory.
pub struct MemoryResourceRepository {
    id: RepositoryId,
    display_name: String,
    namespace: ResourceNamespace,
    lock: ItemMapLock,
    parents: ParentLinks,
    modification_count: AtomicU64,
    maps: Mutex<HashMap<ResourceType, Arc<ResourceMultimap>>>,
    pending: Mutex<PendingUpdates>,
}

impl MemoryResourceRepository {
    /// Create an empty repository with a lock of its own
    pub fn new(display_name: impl Into<String>, namespace: ResourceNamespace) -> Arc<Self> {
        Self::with_lock(display_name, namespace, &ItemMapLock::new())
    }

    /// Create an empty repository sharing `lock` with the tree it will join
    pub fn with_lock(
        display_name: impl Into<String>,
        namespace: ResourceNamespace,
        lock: &ItemMapLock,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: RepositoryId::next(),
            display_name: display_name.into(),
            namespace,
            lock: lock.clone(),
            parents: ParentLinks::new(),
            modification_count: AtomicU64::new(next_modification_count()),
            maps: Mutex::new(HashMap::new()),
            pending: Mutex::new(PendingUpdates::default()),
        })
    }

    /// Create an item owned by this repository
    pub fn new_item(
        &self,
        resource_type: ResourceType,
        name: impl Into<String>,
        configuration: FolderConfiguration,
    ) -> ResourceItem {
        ResourceItem::new(
            self.id,
            self.namespace.clone(),
            resource_type,
            name,
            configuration,
        )
    }

    /// Add an item, adopting it into this repository
    pub fn add_item(&self, item: ResourceItem) -> Arc<ResourceItem> {
        let item = Arc::new(self.adopt(item));
        let added = item.clone();
        self.update(|maps| {
            let resource_type = item.resource_type;
            Arc::make_mut(maps.entry(resource_type).or_default()).insert_item(item);
            vec![resource_type]
        });
        added
    }

    /// Add several items, reporting each affected type once
    pub fn add_items<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = ResourceItem>,
    {
        let items: Vec<ResourceItem> = items.into_iter().map(|item| self.adopt(item)).collect();
        let count = items.len();
        self.update(|maps| {
            let mut changed = BTreeSet::new();
            for item in items {
                changed.insert(item.resource_type);
                Arc::make_mut(maps.entry(item.resource_type).or_default())
                    .insert_item(Arc::new(item));
            }
            changed.into_iter().collect()
        });
        count
    }

    /// Remove the item of `name` defined for `configuration`
    pub fn remove_resource(
        &self,
        resource_type: ResourceType,
        name: &str,
        configuration: &FolderConfiguration,
    ) -> bool {
        let mut removed = false;
        self.update(|maps| {
            if let Some(map) = maps.get_mut(&resource_type) {
                if map.get(name).iter().any(|item| &item.configuration == configuration) {
                    removed = Arc::make_mut(map)
                        .remove_if(name, |item| &item.configuration == configuration);
                }
            }
            if removed {
                vec![resource_type]
            } else {
                Vec::new()
            }
        });
        removed
    }

    /// Replace the whole content of the repository
    pub fn replace_items(&self, items: Vec<ResourceItem>) {
        let mut fresh: HashMap<ResourceType, ResourceMultimap> = HashMap::new();
        for item in items {
            let item = self.adopt(item);
            fresh
                .entry(item.resource_type)
                .or_default()
                .insert_item(Arc::new(item));
        }
        self.update(|maps| {
            let changed: BTreeSet<ResourceType> =
                maps.keys().chain(fresh.keys()).copied().collect();
            *maps = fresh
                .into_iter()
                .map(|(resource_type, map)| (resource_type, Arc::new(map)))
                .collect();
            changed.into_iter().collect()
        });
    }

    /// Remove every item
    pub fn clear(&self) {
        self.replace_items(Vec::new());
    }

    /// Total number of items
    pub fn len(&self) -> usize {
        self.maps.lock().values().map(|map| map.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of composites this repository is attached to
    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }

    /// Start an update; pending-update callbacks wait until the returned
    /// guard is dropped
    pub fn begin_update(&self) -> PendingUpdate<'_> {
        self.pending.lock().count += 1;
        PendingUpdate { repository: self }
    }

    fn finish_update(&self) {
        let callbacks = {
            let mut pending = self.pending.lock();
            pending.count = pending.count.saturating_sub(1);
            if pending.count > 0 {
                return;
            }
            std::mem::take(&mut pending.callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }

    /// Tell the parents that this repository must be treated as a new one,
    /// for example after it was reloaded from scratch
    pub fn reset(&self) {
        let _guard = self.lock.lock();
        self.modification_count
            .store(next_modification_count(), Ordering::SeqCst);
        for parent in self.parents.snapshot() {
            if let Err(e) = parent.on_child_reset() {
                warn!(
                    "{} could not rebuild after {} was reset: {}",
                    parent.display_name(),
                    self.display_name,
                    e
                );
            }
        }
    }

    fn adopt(&self, mut item: ResourceItem) -> ResourceItem {
        item.repository = self.id;
        item.namespace = self.namespace.clone();
        item
    }

    /// Apply `mutate` to the maps and report the types it returns.
    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut HashMap<ResourceType, Arc<ResourceMultimap>>) -> Vec<ResourceType>,
    {
        let _guard = self.lock.lock();
        let changed = mutate(&mut self.maps.lock());
        if changed.is_empty() {
            return;
        }
        self.modification_count
            .store(next_modification_count(), Ordering::SeqCst);
        propagate_invalidation(self.parents.snapshot(), self, &changed);
    }
}

impl SingleNamespaceRepository for MemoryResourceRepository {
    fn id(&self) -> RepositoryId {
        self.id
    }

    fn display_name(&self) -> String {
        self.display_name.clone()
    }

    fn namespace(&self) -> &ResourceNamespace {
        &self.namespace
    }

    fn resources(
        &self,
        namespace: &ResourceNamespace,
        resource_type: ResourceType,
    ) -> Arc<ResourceMultimap> {
        if namespace != &self.namespace {
            return Arc::new(ResourceMultimap::new());
        }
        self.maps
            .lock()
            .entry(resource_type)
            .or_default()
            .clone()
    }
}

impl LocalResourceRepository for MemoryResourceRepository {
    fn item_map_lock(&self) -> &ItemMapLock {
        &self.lock
    }

    fn add_parent(&self, parent: &Arc<MultiResourceRepository>) {
        self.parents.add(parent);
    }

    fn remove_parent(&self, parent: &MultiResourceRepository) {
        self.parents.remove(parent);
    }

    fn modification_count(&self) -> u64 {
        self.modification_count.load(Ordering::SeqCst)
    }

    fn set_modification_count(&self, count: u64) {
        self.modification_count.store(count, Ordering::SeqCst);
    }

    fn invoke_after_pending_updates_finish(&self, callback: UpdatesCallback) {
        {
            let mut pending = self.pending.lock();
            if pending.count > 0 {
                pending.callbacks.push(callback);
                return;
            }
        }
        callback();
    }
}

impl std::fmt::Debug for MemoryResourceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryResourceRepository")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Guard for an update in progress, see
/// [`MemoryResourceRepository::begin_update`].
#[must_use = "the update finishes when the guard is dropped"]
pub struct PendingUpdate<'a> {
    repository: &'a MemoryResourceRepository,
}

impl Drop for PendingUpdate<'_> {
    fn drop(&mut self) {
        self.repository.finish_update();
    }
}
