//! Priority ordering of leaf repositories.
//!
//! Priority is derived from position in the flattened leaf order of a
//! repository tree: the first leaf has priority 0 and wins over every later
//! leaf that defines the same resource.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::resource::{RepositoryId, ResourceItem};

/// Compares items by the priority of the repository that provides them.
///
/// Lower positions sort first, so a sorted list starts with the item that
/// should be visible.
#[derive(Debug, Clone, Default)]
pub struct ResourcePriorityComparator {
    ordering: HashMap<RepositoryId, usize>,
}

impl ResourcePriorityComparator {
    pub fn new<I>(repositories: I) -> Self
    where
        I: IntoIterator<Item = RepositoryId>,
    {
        let mut ordering = HashMap::new();
        for (position, repository) in repositories.into_iter().enumerate() {
            ordering.entry(repository).or_insert(position);
        }
        Self { ordering }
    }

    /// Position of `repository` in the leaf order, if it is known.
    pub fn position(&self, repository: RepositoryId) -> Option<usize> {
        self.ordering.get(&repository).copied()
    }

    pub fn len(&self) -> usize {
        self.ordering.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordering.is_empty()
    }

    /// # Panics
    ///
    /// Panics if either item comes from a repository that is not part of the
    /// leaf order. That means the topology and the cached maps disagree, and
    /// picking an arbitrary order would corrupt override semantics.
    pub fn compare(&self, a: &ResourceItem, b: &ResourceItem) -> Ordering {
        self.priority_of(a).cmp(&self.priority_of(b))
    }

    fn priority_of(&self, item: &ResourceItem) -> usize {
        match self.ordering.get(&item.repository) {
            Some(position) => *position,
            None => panic!(
                "resource {} comes from repository {} which has no priority in the current leaf order",
                item.reference(),
                item.repository
            ),
        }
    }
}

/// Orders items by folder configuration, then by repository priority.
#[derive(Debug, Clone, Default)]
pub struct ResourceItemComparator {
    priority: ResourcePriorityComparator,
}

impl ResourceItemComparator {
    pub fn new(priority: ResourcePriorityComparator) -> Self {
        Self { priority }
    }

    pub fn priority(&self) -> &ResourcePriorityComparator {
        &self.priority
    }

    pub fn compare(&self, a: &ResourceItem, b: &ResourceItem) -> Ordering {
        a.configuration
            .cmp(&b.configuration)
            .then_with(|| self.priority.compare(a, b))
    }
}
