//! Flattening of a repository tree into per-namespace leaf lists.
//!
//! The topology is recomputed whenever the children of a composite change.
//! It records, per namespace:
//!
//! - the leaves in priority order (depth-first, children in order), which is
//!   what the merge cache folds together;
//! - the outermost single-namespace repositories, which is what
//!   namespace-scoped lookups hand out.
//!
//! Computing the topology also validates the children: composites must share
//! the owner's lock, must not contain the owner, and declared namespaces must
//! match the leaves underneath them.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::error::{Error, Result};
use crate::multi::MultiResourceRepository;
use crate::priority::ResourcePriorityComparator;
use crate::repository::{RepositoryNode, SingleNamespaceRepository};
use crate::resource::{RepositoryId, ResourceNamespace};

/// Leaves and namespace roots of a composite's children.
#[derive(Clone, Default)]
pub struct Topology {
    leaf_order: Vec<Arc<dyn SingleNamespaceRepository>>,
    leaves_by_namespace: IndexMap<ResourceNamespace, Vec<Arc<dyn SingleNamespaceRepository>>>,
    repositories_by_namespace: IndexMap<ResourceNamespace, Vec<RepositoryNode>>,
}

impl Topology {
    /// Walks `children` on behalf of `owner`.
    pub fn compute(owner: &MultiResourceRepository, children: &[RepositoryNode]) -> Result<Self> {
        let mut walker = Walker {
            owner,
            path: vec![owner as *const MultiResourceRepository],
            seen: HashSet::new(),
            leaf_order: Vec::new(),
        };
        for child in children {
            walker.collect_leaves(child, child)?;
        }

        let mut leaves_by_namespace: IndexMap<_, Vec<_>> = IndexMap::new();
        for leaf in &walker.leaf_order {
            leaves_by_namespace
                .entry(leaf.namespace().clone())
                .or_default()
                .push(leaf.clone());
        }

        if let Some(namespace) = owner.namespace() {
            if let Some(foreign) = walker
                .leaf_order
                .iter()
                .find(|leaf| leaf.namespace() != namespace)
            {
                return Err(Error::InvalidChild {
                    child: foreign.display_name(),
                    message: format!(
                        "leaf of namespace '{}' added to '{}', which only holds namespace '{}'",
                        foreign.namespace(),
                        owner.display_name(),
                        namespace
                    ),
                });
            }
        }

        Ok(Self {
            leaf_order: walker.leaf_order,
            leaves_by_namespace,
            repositories_by_namespace: compute_namespace_map(children),
        })
    }

    /// Every leaf in priority order.
    pub fn leaf_order(&self) -> &[Arc<dyn SingleNamespaceRepository>] {
        &self.leaf_order
    }

    /// Leaves of `namespace` in priority order.
    pub fn leaves(&self, namespace: &ResourceNamespace) -> &[Arc<dyn SingleNamespaceRepository>] {
        self.leaves_by_namespace
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Outermost single-namespace repositories of `namespace`.
    pub fn repositories(&self, namespace: &ResourceNamespace) -> &[RepositoryNode] {
        self.repositories_by_namespace
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn namespaces(&self) -> BTreeSet<ResourceNamespace> {
        self.repositories_by_namespace.keys().cloned().collect()
    }

    /// The leaf with `id` if it provides items of `namespace`.
    pub fn find_leaf(
        &self,
        namespace: &ResourceNamespace,
        id: RepositoryId,
    ) -> Option<&Arc<dyn SingleNamespaceRepository>> {
        self.leaves(namespace).iter().find(|leaf| leaf.id() == id)
    }

    pub fn priority_comparator(&self) -> ResourcePriorityComparator {
        ResourcePriorityComparator::new(self.leaf_order.iter().map(|leaf| leaf.id()))
    }
}

struct Walker<'a> {
    owner: &'a MultiResourceRepository,
    path: Vec<*const MultiResourceRepository>,
    seen: HashSet<RepositoryId>,
    leaf_order: Vec<Arc<dyn SingleNamespaceRepository>>,
}

impl Walker<'_> {
    /// `top` is the direct child of the owner that `node` was reached from.
    fn collect_leaves(&mut self, node: &RepositoryNode, top: &RepositoryNode) -> Result<()> {
        match node {
            RepositoryNode::Leaf(leaf) => self.push_leaf(leaf),
            RepositoryNode::Composite(multi) => {
                let address = Arc::as_ptr(multi);
                if self.path.contains(&address) {
                    return Err(Error::InvalidChild {
                        child: top.display_name(),
                        message: format!(
                            "'{}' would contain itself through '{}'",
                            self.owner.display_name(),
                            multi.display_name()
                        ),
                    });
                }
                if !multi.lock().same_as(self.owner.lock()) {
                    return Err(Error::InvalidChild {
                        child: multi.display_name().to_string(),
                        message: format!(
                            "does not share the item map lock of '{}'",
                            self.owner.display_name()
                        ),
                    });
                }
                self.path.push(address);
                for child in multi.children().iter() {
                    self.collect_leaves(child, top)?;
                }
                self.path.pop();
            }
            RepositoryNode::Opaque(other) => {
                let declared = other.namespaces();
                for leaf in other.leaf_repositories() {
                    if !declared.contains(leaf.namespace()) {
                        return Err(Error::InvalidChild {
                            child: other.display_name(),
                            message: format!(
                                "exposes leaf '{}' of undeclared namespace '{}'",
                                leaf.display_name(),
                                leaf.namespace()
                            ),
                        });
                    }
                    self.push_leaf(&leaf);
                }
            }
        }
        Ok(())
    }

    fn push_leaf(&mut self, leaf: &Arc<dyn SingleNamespaceRepository>) {
        if self.seen.insert(leaf.id()) {
            self.leaf_order.push(leaf.clone());
        } else {
            debug!(
                "Leaf {} is reachable more than once under {}; keeping its first position",
                leaf.display_name(),
                self.owner.display_name()
            );
        }
    }
}

/// Groups the outermost single-namespace repositories of `children` by
/// namespace. Descends through composites that span several namespaces.
fn compute_namespace_map(
    children: &[RepositoryNode],
) -> IndexMap<ResourceNamespace, Vec<RepositoryNode>> {
    let mut map: IndexMap<ResourceNamespace, Vec<RepositoryNode>> = IndexMap::new();
    let mut seen = HashSet::new();
    let mut stack: Vec<RepositoryNode> = children.iter().rev().cloned().collect();

    while let Some(node) = stack.pop() {
        match &node {
            RepositoryNode::Leaf(leaf) => {
                let namespace = leaf.namespace().clone();
                if seen.insert(node.address()) {
                    map.entry(namespace).or_default().push(node);
                }
            }
            RepositoryNode::Composite(multi) => match multi.namespace() {
                Some(namespace) => {
                    let namespace = namespace.clone();
                    if seen.insert(node.address()) {
                        map.entry(namespace).or_default().push(node);
                    }
                }
                None => stack.extend(multi.children().iter().rev().cloned()),
            },
            RepositoryNode::Opaque(other) => stack.extend(
                other
                    .leaf_repositories()
                    .into_iter()
                    .rev()
                    .map(RepositoryNode::Leaf),
            ),
        }
    }
    map
}
