//! The composite repository.
//!
//! A [`MultiResourceRepository`] owns an ordered list of children and
//! exposes their merged view. Earlier children have higher priority: when two
//! leaves define the same resource for the same folder configuration, only
//! the item of the earlier leaf is visible.
//!
//! ## Children
//!
//! Children come in three groups, in priority order:
//!
//! 1. local repositories, which may change and report changes upward;
//! 2. libraries, immutable single-namespace leaves;
//! 3. other repositories, which only contribute the leaves they wrap.
//!
//! ## Invalidation
//!
//! Structural changes (`set_children`, `on_child_reset`) recompute the
//! topology and drop every cached map. Content changes of a leaf only mark
//! that leaf as unreconciled in the affected slots; the next query for such a
//! slot patches it in place. Both kinds travel upward through parents.
//!
//! ## Locking
//!
//! Every node of a tree shares one [`ItemMapLock`]. Public operations hold
//! it for their whole duration, which makes `set_children` atomic with
//! respect to queries. The node's own state sits behind a separate mutex that
//! is never held while calling into another composite.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::merge_cache::{MergeCache, MergeStats};
use crate::multimap::ResourceMultimap;
use crate::priority::ResourceItemComparator;
use crate::repository::{
    next_modification_count, ItemMapLock, LocalRepository, ParentLinks, RepositoryNode,
    ResourceRepository, SingleNamespaceRepository, UpdatesCallback,
};
use crate::resource::{ResourceNamespace, ResourceType};
use crate::topology::Topology;
use crate::visitor::{ResourceVisitor, VisitResult};

struct State {
    local_resources: Arc<[LocalRepository]>,
    children: Arc<[RepositoryNode]>,
    topology: Topology,
    comparator: Arc<ResourceItemComparator>,
    cache: MergeCache,
    modification_count: u64,
    child_modification_counts: Vec<u64>,
}

impl State {
    fn new() -> Self {
        Self {
            local_resources: Arc::from(Vec::new()),
            children: Arc::from(Vec::new()),
            topology: Topology::default(),
            comparator: Arc::default(),
            cache: MergeCache::new(),
            modification_count: next_modification_count(),
            child_modification_counts: Vec::new(),
        }
    }

    fn install(&mut self, topology: Topology, modification_count: u64) {
        self.comparator = Arc::new(ResourceItemComparator::new(topology.priority_comparator()));
        self.topology = topology;
        self.cache.clear();
        self.modification_count = modification_count;
    }
}

/// A repository combining the resources of its children.
pub struct MultiResourceRepository {
    display_name: String,
    namespace: Option<ResourceNamespace>,
    lock: ItemMapLock,
    self_ref: Weak<MultiResourceRepository>,
    parents: ParentLinks,
    stale_invalidations: AtomicU64,
    state: Mutex<State>,
}

impl MultiResourceRepository {
    /// Creates an empty composite with a lock of its own.
    pub fn new(display_name: impl Into<String>) -> Arc<Self> {
        Self::build(display_name.into(), None, ItemMapLock::new())
    }

    /// Creates an empty composite sharing `lock` with the rest of its tree.
    pub fn with_lock(display_name: impl Into<String>, lock: &ItemMapLock) -> Arc<Self> {
        Self::build(display_name.into(), None, lock.clone())
    }

    /// Creates an empty composite whose leaves must all belong to `namespace`.
    pub fn with_namespace(
        display_name: impl Into<String>,
        namespace: ResourceNamespace,
        lock: &ItemMapLock,
    ) -> Arc<Self> {
        Self::build(display_name.into(), Some(namespace), lock.clone())
    }

    fn build(
        display_name: String,
        namespace: Option<ResourceNamespace>,
        lock: ItemMapLock,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            display_name,
            namespace,
            lock,
            self_ref: self_ref.clone(),
            parents: ParentLinks::new(),
            stale_invalidations: AtomicU64::new(0),
            state: Mutex::new(State::new()),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The single namespace this composite is restricted to, if any.
    pub fn namespace(&self) -> Option<&ResourceNamespace> {
        self.namespace.as_ref()
    }

    pub fn lock(&self) -> &ItemMapLock {
        &self.lock
    }

    /// Replaces the children of this repository.
    ///
    /// Previous local children are detached, the new ones are attached, and
    /// every cached map is dropped. With exactly one local child the child's
    /// modification count is synchronized with this repository's.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChild`](crate::error::Error::InvalidChild) if
    /// the children are inconsistent with this repository. The previous
    /// children stay in place in that case.
    pub fn set_children(
        &self,
        local: Vec<LocalRepository>,
        libraries: Vec<Arc<dyn SingleNamespaceRepository>>,
        others: Vec<Arc<dyn ResourceRepository>>,
    ) -> Result<()> {
        let _guard = self.lock.lock();

        for child in &local {
            if let LocalRepository::Leaf(leaf) = child {
                if !leaf.item_map_lock().same_as(&self.lock) {
                    return Err(Error::InvalidChild {
                        child: leaf.display_name(),
                        message: format!(
                            "does not share the item map lock of '{}'",
                            self.display_name
                        ),
                    });
                }
            }
        }

        let children: Vec<RepositoryNode> = local
            .iter()
            .map(LocalRepository::as_node)
            .chain(libraries.into_iter().map(RepositoryNode::Leaf))
            .chain(others.into_iter().map(RepositoryNode::Opaque))
            .collect();
        let topology = Topology::compute(self, &children)?;

        self.release();

        let count = next_modification_count();
        if let [only] = local.as_slice() {
            only.set_modification_count(count);
        }
        if let Some(this) = self.self_ref.upgrade() {
            for child in &local {
                child.add_parent(&this);
            }
        }
        let child_counts: Vec<u64> = local
            .iter()
            .map(LocalRepository::modification_count)
            .collect();

        debug!(
            "{}: {} children, {} leaves in {} namespaces",
            self.display_name,
            children.len(),
            topology.leaf_order().len(),
            topology.namespaces().len()
        );
        {
            let mut state = self.state.lock();
            state.install(topology, count);
            state.local_resources = Arc::from(local);
            state.children = Arc::from(children);
            state.child_modification_counts = child_counts;
        }

        self.notify_parents_of_reset();
        Ok(())
    }

    /// Snapshot of the local children.
    pub fn local_resources(&self) -> Arc<[LocalRepository]> {
        let _guard = self.lock.lock();
        self.state.lock().local_resources.clone()
    }

    /// Snapshot of all children in priority order.
    pub fn children(&self) -> Arc<[RepositoryNode]> {
        let _guard = self.lock.lock();
        self.state.lock().children.clone()
    }

    /// Recomputes the topology after a composite child changed its own
    /// children, then tells this repository's parents.
    pub fn on_child_reset(&self) -> Result<()> {
        let _guard = self.lock.lock();
        let children = self.children();
        let topology = Topology::compute(self, &children)?;
        self.state.lock().install(topology, next_modification_count());
        self.notify_parents_of_reset();
        Ok(())
    }

    fn notify_parents_of_reset(&self) {
        for parent in self.parents.snapshot() {
            if let Err(e) = parent.on_child_reset() {
                warn!(
                    "{} rejected the new children of {}: {}",
                    parent.display_name(),
                    self.display_name,
                    e
                );
            }
        }
    }

    /// Reports that the content of `leaf` changed for `types`.
    ///
    /// The call propagates to every ancestor. Events from leaves that are no
    /// longer part of this tree are ignored.
    pub fn invalidate_cache_for(
        &self,
        leaf: &dyn SingleNamespaceRepository,
        types: &[ResourceType],
    ) {
        if let Some(this) = self.self_ref.upgrade() {
            propagate_invalidation(vec![this], leaf, types);
        }
    }

    /// Marks `leaf` unreconciled in the cached maps of this repository only.
    /// Returns false for a stale event.
    fn mark_unreconciled(
        &self,
        leaf: &dyn SingleNamespaceRepository,
        types: &[ResourceType],
    ) -> bool {
        let _guard = self.lock.lock();
        let mut state = self.state.lock();
        let namespace = leaf.namespace();
        let leaf_count = state.topology.leaves(namespace).len();
        if state.topology.find_leaf(namespace, leaf.id()).is_none() {
            drop(state);
            let stale = self.stale_invalidations.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(
                "{}: ignoring invalidation from {}, which is not one of its leaves ({} so far)",
                self.display_name,
                leaf.display_name(),
                stale
            );
            return false;
        }
        if leaf_count > 1 {
            state.cache.mark_unreconciled(namespace, leaf.id(), types);
        }
        state.modification_count = next_modification_count();
        true
    }

    /// Drops every cached map of this repository and its ancestors.
    pub fn invalidate_cache(&self) {
        let _guard = self.lock.lock();
        let Some(this) = self.self_ref.upgrade() else {
            return;
        };
        let mut visited = HashSet::new();
        let mut pending = vec![this];
        while let Some(repository) = pending.pop() {
            if !visited.insert(Arc::as_ptr(&repository)) {
                continue;
            }
            {
                let _guard = repository.lock.lock();
                let mut state = repository.state.lock();
                state.cache.clear();
                state.modification_count = next_modification_count();
            }
            pending.extend(repository.parents.snapshot());
        }
    }

    /// Drops cached maps to free memory. They are rebuilt on demand.
    pub fn on_low_memory(&self) {
        let _guard = self.lock.lock();
        let mut state = self.state.lock();
        let dropped = state.cache.len();
        state.cache.clear();
        warn!(
            "{}: low memory, dropped {} cached resource maps",
            self.display_name, dropped
        );
    }

    /// Detaches this repository from its local children.
    pub fn release(&self) {
        let _guard = self.lock.lock();
        let local = self.state.lock().local_resources.clone();
        for child in local.iter() {
            child.remove_parent(self);
        }
    }

    pub fn add_parent(&self, parent: &Arc<MultiResourceRepository>) {
        self.parents.add(parent);
    }

    pub fn remove_parent(&self, parent: &MultiResourceRepository) {
        self.parents.remove(parent);
    }

    /// Composites this repository is currently attached to.
    pub fn parents(&self) -> Vec<Arc<MultiResourceRepository>> {
        self.parents.snapshot()
    }

    /// Visible items of `resource_type` in `namespace`.
    ///
    /// The result is an immutable snapshot. When a single leaf provides the
    /// namespace, it is that leaf's own map.
    pub fn get_map(
        &self,
        namespace: &ResourceNamespace,
        resource_type: ResourceType,
    ) -> Arc<ResourceMultimap> {
        let _guard = self.lock.lock();
        let mut state = self.state.lock();
        let State {
            topology,
            cache,
            comparator,
            ..
        } = &mut *state;
        cache.get_map(namespace, resource_type, topology.leaves(namespace), comparator)
    }

    /// Whether any visible item of `resource_type` is named `name`.
    pub fn has_resources(
        &self,
        namespace: &ResourceNamespace,
        resource_type: ResourceType,
        name: &str,
    ) -> bool {
        self.get_map(namespace, resource_type).contains_key(name)
    }

    pub fn namespaces(&self) -> BTreeSet<ResourceNamespace> {
        let _guard = self.lock.lock();
        self.state.lock().topology.namespaces()
    }

    /// Outermost single-namespace repositories providing `namespace`.
    pub fn repositories_for_namespace(&self, namespace: &ResourceNamespace) -> Vec<RepositoryNode> {
        let _guard = self.lock.lock();
        self.state.lock().topology.repositories(namespace).to_vec()
    }

    /// Every leaf in priority order.
    pub fn leaf_resource_repositories(&self) -> Vec<Arc<dyn SingleNamespaceRepository>> {
        let _guard = self.lock.lock();
        self.state.lock().topology.leaf_order().to_vec()
    }

    /// Feeds the visible items of every namespace and type to `visitor`.
    ///
    /// The visitor may call back into this repository.
    pub fn accept<V>(&self, visitor: &mut V) -> VisitResult
    where
        V: ResourceVisitor + ?Sized,
    {
        let _guard = self.lock.lock();
        for namespace in self.namespaces() {
            if !visitor.should_visit_namespace(&namespace) {
                continue;
            }
            for resource_type in ResourceType::ALL {
                if !visitor.should_visit_resource_type(resource_type) {
                    continue;
                }
                let map = self.get_map(&namespace, resource_type);
                for item in map.values() {
                    if visitor.visit(item) == VisitResult::Abort {
                        return VisitResult::Abort;
                    }
                }
            }
        }
        VisitResult::Continue
    }

    /// Modification count of the tree below this repository.
    ///
    /// With a single local child this is the child's count. Otherwise it is
    /// bumped whenever the count of any local child moved.
    pub fn modification_count(&self) -> u64 {
        let _guard = self.lock.lock();
        let local = self.state.lock().local_resources.clone();
        if let [only] = &*local {
            return only.modification_count();
        }
        let counts: Vec<u64> = local.iter().map(LocalRepository::modification_count).collect();
        let mut state = self.state.lock();
        if state.child_modification_counts != counts {
            state.child_modification_counts = counts;
            state.modification_count = next_modification_count();
        }
        state.modification_count
    }

    pub fn set_modification_count(&self, count: u64) {
        let _guard = self.lock.lock();
        self.state.lock().modification_count = count;
    }

    /// Runs `callback` once every local child has finished its pending
    /// updates. Runs it right away when there are no local children.
    pub fn invoke_after_pending_updates_finish(&self, callback: UpdatesCallback) {
        let local = self.local_resources();
        if local.is_empty() {
            callback();
            return;
        }
        let remaining = Arc::new(AtomicUsize::new(local.len()));
        let callback = Arc::new(Mutex::new(Some(callback)));
        for child in local.iter() {
            let remaining = remaining.clone();
            let callback = callback.clone();
            child.invoke_after_pending_updates_finish(Box::new(move || {
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let callback = callback.lock().take();
                    if let Some(callback) = callback {
                        callback();
                    }
                }
            }));
        }
    }

    /// Number of ignored invalidation events from leaves outside this tree.
    pub fn stale_invalidations(&self) -> u64 {
        self.stale_invalidations.load(Ordering::Relaxed)
    }

    pub fn merge_stats(&self) -> MergeStats {
        let _guard = self.lock.lock();
        self.state.lock().cache.stats()
    }

    /// Number of cached merged maps.
    pub fn cached_map_count(&self) -> usize {
        let _guard = self.lock.lock();
        self.state.lock().cache.len()
    }
}

impl fmt::Debug for MultiResourceRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiResourceRepository")
            .field("display_name", &self.display_name)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Reports a content change of `leaf` to `parents` and all their ancestors.
///
/// Each composite is visited once even when it is reachable through several
/// paths. Composites that do not know `leaf` stop the walk on their branch.
pub fn propagate_invalidation(
    parents: Vec<Arc<MultiResourceRepository>>,
    leaf: &dyn SingleNamespaceRepository,
    types: &[ResourceType],
) {
    let mut visited = HashSet::new();
    let mut pending = parents;
    while let Some(repository) = pending.pop() {
        if !visited.insert(Arc::as_ptr(&repository)) {
            continue;
        }
        if repository.mark_unreconciled(leaf, types) {
            pending.extend(repository.parents.snapshot());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryResourceRepository;
    use crate::memory::MemoryResourceRepository;
    use crate::repository::LocalResourceRepository;
    use crate::resource::{FolderConfiguration, ResourceItem};
    use crate::visitor::CollectingVisitor;

    fn ns() -> ResourceNamespace {
        ResourceNamespace::res_auto()
    }

    fn add_string(leaf: &MemoryResourceRepository, name: &str, config: &str, value: &str) {
        let config: FolderConfiguration = config.parse().unwrap();
        leaf.add_item(leaf.new_item(ResourceType::String, name, config).with_value(value));
    }

    fn visible(repository: &MultiResourceRepository, name: &str) -> Vec<String> {
        repository
            .get_map(&ns(), ResourceType::String)
            .get(name)
            .iter()
            .filter_map(|item| item.value.clone())
            .collect()
    }

    fn tree() -> (
        Arc<MultiResourceRepository>,
        Arc<MemoryResourceRepository>,
        Arc<MemoryResourceRepository>,
    ) {
        let lock = ItemMapLock::new();
        let root = MultiResourceRepository::with_lock("app", &lock);
        let main = MemoryResourceRepository::with_lock("main", ns(), &lock);
        let lib = MemoryResourceRepository::with_lock("lib", ns(), &lock);
        root.set_children(vec![main.clone().into(), lib.clone().into()], vec![], vec![])
            .unwrap();
        (root, main, lib)
    }

    #[test]
    fn test_set_children_attaches_and_detaches_parents() {
        let (root, main, lib) = tree();
        assert_eq!(main.parent_count(), 1);
        assert_eq!(lib.parent_count(), 1);

        root.set_children(vec![main.clone().into()], vec![], vec![])
            .unwrap();
        assert_eq!(main.parent_count(), 1);
        assert_eq!(lib.parent_count(), 0);
        assert_eq!(root.local_resources().len(), 1);
    }

    #[test]
    fn test_override_and_content_change() {
        let (root, main, lib) = tree();
        add_string(&main, "app_name", "default", "A");
        add_string(&lib, "app_name", "default", "B");
        add_string(&lib, "app_name", "fr", "C");

        assert_eq!(visible(&root, "app_name"), vec!["A", "C"]);

        main.remove_resource(ResourceType::String, "app_name", &FolderConfiguration::default());
        assert_eq!(visible(&root, "app_name"), vec!["B", "C"]);
        assert_eq!(root.merge_stats().full_merges, 1);
        assert_eq!(root.merge_stats().reconciliations, 1);
    }

    #[test]
    fn test_set_children_resets_priority() {
        let (root, main, lib) = tree();
        add_string(&main, "app_name", "default", "A");
        add_string(&lib, "app_name", "default", "B");
        assert_eq!(visible(&root, "app_name"), vec!["A"]);

        root.set_children(vec![lib.clone().into(), main.clone().into()], vec![], vec![])
            .unwrap();
        assert_eq!(root.cached_map_count(), 0);
        assert_eq!(visible(&root, "app_name"), vec!["B"]);
    }

    #[test]
    fn test_rejected_children_leave_state_untouched() {
        let (root, main, lib) = tree();
        let stranger = MultiResourceRepository::new("stranger");
        let result = root.set_children(
            vec![main.clone().into(), LocalRepository::Multi(stranger)],
            vec![],
            vec![],
        );
        assert!(result.is_err());
        assert_eq!(root.local_resources().len(), 2);
        assert_eq!(lib.parent_count(), 1);
    }

    #[test]
    fn test_leaf_with_foreign_lock_is_rejected() {
        let (root, main, lib) = tree();
        let loner = MemoryResourceRepository::new("loner", ns());
        let result = root.set_children(
            vec![main.clone().into(), loner.clone().into()],
            vec![],
            vec![],
        );
        match result {
            Err(Error::InvalidChild { child, message }) => {
                assert_eq!(child, "loner");
                assert!(message.contains("item map lock of 'app'"));
            }
            other => panic!("expected InvalidChild, got {:?}", other),
        }
        assert_eq!(loner.parent_count(), 0);
        assert_eq!(lib.parent_count(), 1);
        assert_eq!(root.local_resources().len(), 2);
    }

    #[test]
    fn test_single_local_child_shares_modification_count() {
        let root = MultiResourceRepository::new("app");
        let main = MemoryResourceRepository::with_lock("main", ns(), root.lock());
        root.set_children(vec![main.clone().into()], vec![], vec![]).unwrap();
        assert_eq!(root.modification_count(), main.modification_count());

        add_string(&main, "x", "default", "1");
        assert_eq!(root.modification_count(), main.modification_count());
    }

    #[test]
    fn test_modification_count_moves_with_children() {
        let (root, main, _lib) = tree();
        let before = root.modification_count();
        assert_eq!(root.modification_count(), before);
        add_string(&main, "x", "default", "1");
        assert!(root.modification_count() > before);
    }

    #[test]
    fn test_stale_invalidation_is_counted() {
        let (root, _main, _lib) = tree();
        let outsider = MemoryResourceRepository::new("outsider", ns());
        root.invalidate_cache_for(outsider.as_ref(), &[ResourceType::String]);
        assert_eq!(root.stale_invalidations(), 1);
    }

    #[test]
    fn test_invalidate_cache_and_low_memory_drop_slots() {
        let (root, main, lib) = tree();
        add_string(&main, "a", "default", "1");
        add_string(&lib, "b", "default", "2");
        root.get_map(&ns(), ResourceType::String);
        assert_eq!(root.cached_map_count(), 1);

        root.on_low_memory();
        assert_eq!(root.cached_map_count(), 0);

        root.get_map(&ns(), ResourceType::String);
        let before = root.modification_count();
        root.invalidate_cache();
        assert_eq!(root.cached_map_count(), 0);
        assert!(root.modification_count() >= before);
        assert_eq!(visible(&root, "b"), vec!["2"]);
    }

    #[test]
    fn test_libraries_rank_after_local_children() {
        let root = MultiResourceRepository::new("app");
        let main = MemoryResourceRepository::with_lock("main", ns(), root.lock());
        add_string(&main, "ok", "default", "local");
        let library = Arc::new(LibraryResourceRepository::new(
            "lib",
            ns(),
            vec![main
                .new_item(ResourceType::String, "ok", FolderConfiguration::default())
                .with_value("library")],
        ));
        root.set_children(vec![main.clone().into()], vec![library], vec![])
            .unwrap();
        assert_eq!(visible(&root, "ok"), vec!["local"]);
        let names: Vec<String> = root
            .leaf_resource_repositories()
            .iter()
            .map(|leaf| leaf.display_name())
            .collect();
        assert_eq!(names, vec!["main", "lib"]);
    }

    #[test]
    fn test_accept_aborts_early() {
        let (root, main, lib) = tree();
        add_string(&main, "a", "default", "1");
        add_string(&lib, "b", "default", "2");

        let mut seen = 0;
        let result = root.accept(&mut |_: &Arc<ResourceItem>| {
            seen += 1;
            VisitResult::Abort
        });
        assert_eq!(result, VisitResult::Abort);
        assert_eq!(seen, 1);

        let mut collector = CollectingVisitor::new().types(vec![ResourceType::String]);
        assert_eq!(root.accept(&mut collector), VisitResult::Continue);
        assert_eq!(collector.items.len(), 2);
    }

    #[test]
    fn test_pending_updates_without_children_fire_immediately() {
        let root = MultiResourceRepository::new("empty");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        root.invoke_after_pending_updates_finish(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pending_updates_wait_for_every_child() {
        let (root, main, lib) = tree();
        let main_update = main.begin_update();
        let lib_update = lib.begin_update();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        root.invoke_after_pending_updates_finish(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        drop(main_update);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        drop(lib_update);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_nested_reset_propagates_to_parent() {
        let lock = ItemMapLock::new();
        let root = MultiResourceRepository::with_lock("app", &lock);
        let module = MultiResourceRepository::with_lock("module", &lock);
        let a = MemoryResourceRepository::with_lock("a", ns(), &lock);
        let b = MemoryResourceRepository::with_lock("b", ns(), &lock);
        add_string(&a, "x", "default", "from-a");
        add_string(&b, "x", "default", "from-b");
        module.set_children(vec![a.clone().into()], vec![], vec![]).unwrap();
        root.set_children(vec![LocalRepository::Multi(module.clone())], vec![], vec![])
            .unwrap();
        assert_eq!(visible(&root, "x"), vec!["from-a"]);

        module
            .set_children(vec![b.clone().into(), a.clone().into()], vec![], vec![])
            .unwrap();
        assert_eq!(visible(&root, "x"), vec!["from-b"]);
        assert_eq!(root.leaf_resource_repositories().len(), 2);
    }
}
