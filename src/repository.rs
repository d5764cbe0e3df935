//! Repository interfaces and the plumbing shared by every node of a tree.
//!
//! A repository tree is made of three kinds of nodes:
//!
//! - leaves implementing [`SingleNamespaceRepository`], which actually hold
//!   resource items (mutable leaves additionally implement
//!   [`LocalResourceRepository`]);
//! - composites ([`MultiResourceRepository`]), which own an ordered list of
//!   children and expose their merged view;
//! - opaque repositories implementing [`ResourceRepository`], which only
//!   contribute the leaves they wrap.
//!
//! Children never own their parents. A local child keeps a weak registration
//! handle ([`ParentLinks`]) for every parent it was attached to, so it can
//! report content changes upward.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

use crate::multi::MultiResourceRepository;
use crate::multimap::ResourceMultimap;
use crate::resource::{RepositoryId, ResourceNamespace, ResourceType};

static MODIFICATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh, process-wide monotonically increasing modification count.
pub fn next_modification_count() -> u64 {
    MODIFICATION_COUNTER.fetch_add(1, Ordering::SeqCst) + 1
}

/// Callback run once every pending update of a subtree has finished.
pub type UpdatesCallback = Box<dyn FnOnce() + Send + 'static>;

/// Lock guarding the item maps of a whole repository tree.
///
/// Clones share the same underlying mutex. The lock is reentrant, so
/// invalidation that travels upward through several composites on one thread
/// can take it again at every level.
#[derive(Clone, Default)]
pub struct ItemMapLock(Arc<ReentrantMutex<()>>);

impl ItemMapLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.0.lock()
    }

    /// Whether both handles guard the same mutex.
    pub fn same_as(&self, other: &ItemMapLock) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ItemMapLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemMapLock({:p})", Arc::as_ptr(&self.0))
    }
}

/// A repository that holds the items of exactly one namespace.
pub trait SingleNamespaceRepository: Send + Sync {
    fn id(&self) -> RepositoryId;

    fn display_name(&self) -> String;

    fn namespace(&self) -> &ResourceNamespace;

    /// Items of `resource_type` in `namespace`. Empty for any namespace other
    /// than [`SingleNamespaceRepository::namespace`].
    fn resources(
        &self,
        namespace: &ResourceNamespace,
        resource_type: ResourceType,
    ) -> Arc<ResourceMultimap>;
}

/// A leaf whose content can change while it is part of a tree.
pub trait LocalResourceRepository: SingleNamespaceRepository {
    /// Lock guarding this leaf's items. Must be the lock of every tree the
    /// leaf joins.
    fn item_map_lock(&self) -> &ItemMapLock;

    /// Registers `parent` to be told about content changes.
    fn add_parent(&self, parent: &Arc<MultiResourceRepository>);

    fn remove_parent(&self, parent: &MultiResourceRepository);

    fn modification_count(&self) -> u64;

    fn set_modification_count(&self, count: u64);

    /// Runs `callback` once the updates pending at the time of the call have
    /// finished, or immediately when there are none.
    fn invoke_after_pending_updates_finish(&self, callback: UpdatesCallback);
}

/// A read-only repository that is neither a leaf nor a composite, such as a
/// bundle of libraries. It only contributes the leaves it wraps.
pub trait ResourceRepository: Send + Sync {
    fn display_name(&self) -> String;

    fn namespaces(&self) -> BTreeSet<ResourceNamespace>;

    fn leaf_repositories(&self) -> Vec<Arc<dyn SingleNamespaceRepository>>;
}

/// A child of a composite.
#[derive(Clone)]
pub enum RepositoryNode {
    Leaf(Arc<dyn SingleNamespaceRepository>),
    Composite(Arc<MultiResourceRepository>),
    Opaque(Arc<dyn ResourceRepository>),
}

impl RepositoryNode {
    pub fn display_name(&self) -> String {
        match self {
            RepositoryNode::Leaf(leaf) => leaf.display_name(),
            RepositoryNode::Composite(multi) => multi.display_name().to_string(),
            RepositoryNode::Opaque(other) => other.display_name(),
        }
    }

    /// Identity of the node, for deduplication.
    pub(crate) fn address(&self) -> *const () {
        match self {
            RepositoryNode::Leaf(leaf) => Arc::as_ptr(leaf) as *const (),
            RepositoryNode::Composite(multi) => Arc::as_ptr(multi) as *const (),
            RepositoryNode::Opaque(other) => Arc::as_ptr(other) as *const (),
        }
    }
}

impl fmt::Debug for RepositoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            RepositoryNode::Leaf(_) => "Leaf",
            RepositoryNode::Composite(_) => "Composite",
            RepositoryNode::Opaque(_) => "Opaque",
        };
        write!(f, "{}({})", kind, self.display_name())
    }
}

/// A mutable child of a composite: a local leaf or a nested composite.
#[derive(Clone)]
pub enum LocalRepository {
    Leaf(Arc<dyn LocalResourceRepository>),
    Multi(Arc<MultiResourceRepository>),
}

impl LocalRepository {
    pub fn display_name(&self) -> String {
        match self {
            LocalRepository::Leaf(leaf) => leaf.display_name(),
            LocalRepository::Multi(multi) => multi.display_name().to_string(),
        }
    }

    pub fn as_node(&self) -> RepositoryNode {
        match self {
            LocalRepository::Leaf(leaf) => RepositoryNode::Leaf(leaf.clone()),
            LocalRepository::Multi(multi) => RepositoryNode::Composite(multi.clone()),
        }
    }

    pub fn add_parent(&self, parent: &Arc<MultiResourceRepository>) {
        match self {
            LocalRepository::Leaf(leaf) => leaf.add_parent(parent),
            LocalRepository::Multi(multi) => multi.add_parent(parent),
        }
    }

    pub fn remove_parent(&self, parent: &MultiResourceRepository) {
        match self {
            LocalRepository::Leaf(leaf) => leaf.remove_parent(parent),
            LocalRepository::Multi(multi) => multi.remove_parent(parent),
        }
    }

    pub fn modification_count(&self) -> u64 {
        match self {
            LocalRepository::Leaf(leaf) => leaf.modification_count(),
            LocalRepository::Multi(multi) => multi.modification_count(),
        }
    }

    pub fn set_modification_count(&self, count: u64) {
        match self {
            LocalRepository::Leaf(leaf) => leaf.set_modification_count(count),
            LocalRepository::Multi(multi) => multi.set_modification_count(count),
        }
    }

    pub fn invoke_after_pending_updates_finish(&self, callback: UpdatesCallback) {
        match self {
            LocalRepository::Leaf(leaf) => leaf.invoke_after_pending_updates_finish(callback),
            LocalRepository::Multi(multi) => multi.invoke_after_pending_updates_finish(callback),
        }
    }
}

impl fmt::Debug for LocalRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalRepository::Leaf(_) => write!(f, "Leaf({})", self.display_name()),
            LocalRepository::Multi(_) => write!(f, "Multi({})", self.display_name()),
        }
    }
}

impl<T> From<Arc<T>> for LocalRepository
where
    T: LocalResourceRepository + 'static,
{
    fn from(leaf: Arc<T>) -> Self {
        LocalRepository::Leaf(leaf)
    }
}

impl From<Arc<MultiResourceRepository>> for RepositoryNode {
    fn from(multi: Arc<MultiResourceRepository>) -> Self {
        RepositoryNode::Composite(multi)
    }
}

/// Weak registrations of the composites a child has been attached to.
#[derive(Default)]
pub struct ParentLinks {
    parents: Mutex<Vec<Weak<MultiResourceRepository>>>,
}

impl ParentLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `parent`; registering the same parent twice has no effect.
    pub fn add(&self, parent: &Arc<MultiResourceRepository>) {
        let mut parents = self.parents.lock();
        parents.retain(|weak| weak.strong_count() > 0);
        let address = Arc::as_ptr(parent);
        if !parents.iter().any(|weak| weak.as_ptr() == address) {
            parents.push(Arc::downgrade(parent));
        }
    }

    pub fn remove(&self, parent: &MultiResourceRepository) {
        let address = parent as *const MultiResourceRepository;
        self.parents
            .lock()
            .retain(|weak| weak.strong_count() > 0 && weak.as_ptr() != address);
    }

    /// Parents that are still alive.
    pub fn snapshot(&self) -> Vec<Arc<MultiResourceRepository>> {
        self.parents.lock().iter().filter_map(Weak::upgrade).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ParentLinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .snapshot()
            .iter()
            .map(|parent| parent.display_name().to_string())
            .collect();
        f.debug_struct("ParentLinks").field("parents", &names).finish()
    }
}
