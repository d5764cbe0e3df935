//! Multimap that folds same-configuration items by repository priority.
//!
//! A [`PerConfigResourceMap`] may store several items for the same resource
//! name and folder configuration, but readers only ever see one of them: the
//! item from the highest-priority repository. Shadowed items are retained so
//! that removing the visible item (for example when its repository is
//! reconciled) promotes the next one without a rebuild.
//!
//! ## Layout
//!
//! For each name the map keeps a list of configuration buckets sorted by
//! folder configuration. Each bucket is non-empty and sorted by priority, so
//! the visible item of a bucket is always its first element.
//!
//! ```text
//! "app_name" -> [ default: [main, lib], fr: [lib], night: [flavor, main] ]
//!                          ^^^^              ^^^           ^^^^^^
//!                          visible           visible       visible
//! ```

use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::multimap::ResourceMultimap;
use crate::priority::ResourceItemComparator;
use crate::resource::{FolderConfiguration, ResourceItem};

/// Configuration buckets of a single resource name.
///
/// Read accessors (`len`, `get`, `iter`) expose one item per configuration.
/// Mutators work on every retained item.
#[derive(Debug, Clone, Default)]
pub struct PerConfigResourceList {
    buckets: Vec<Vec<Arc<ResourceItem>>>,
}

impl PerConfigResourceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct configurations, i.e. visible items.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Visible item of the `index`-th configuration.
    pub fn get(&self, index: usize) -> Option<&Arc<ResourceItem>> {
        self.buckets.get(index).and_then(|bucket| bucket.first())
    }

    /// Visible items in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceItem>> {
        self.buckets.iter().filter_map(|bucket| bucket.first())
    }

    /// Every retained item, including shadowed ones.
    pub fn candidates(&self) -> impl Iterator<Item = &Arc<ResourceItem>> {
        self.buckets.iter().flatten()
    }

    pub fn add(&mut self, item: Arc<ResourceItem>, comparator: &ResourceItemComparator) {
        self.add_from(item, 0, comparator);
    }

    /// Adds a batch of items.
    ///
    /// The batch is sorted by configuration and priority first, so each
    /// bucket search can start where the previous one ended.
    pub fn add_all(
        &mut self,
        items: Vec<Arc<ResourceItem>>,
        comparator: &ResourceItemComparator,
    ) -> bool {
        match items.len() {
            0 => false,
            1 => {
                if let Some(item) = items.into_iter().next() {
                    self.add(item, comparator);
                }
                true
            }
            _ => {
                let sorted = sorted_items(items, comparator);
                let mut start = 0;
                for item in sorted {
                    start = self.add_from(item, start, comparator);
                }
                true
            }
        }
    }

    /// Inserts `item` searching buckets from `start`; returns its bucket index.
    fn add_from(
        &mut self,
        item: Arc<ResourceItem>,
        start: usize,
        comparator: &ResourceItemComparator,
    ) -> usize {
        match self.find_config_index(&item.configuration, start, self.buckets.len()) {
            Err(index) => {
                self.buckets.insert(index, vec![item]);
                index
            }
            Ok(index) => {
                let bucket = &mut self.buckets[index];
                // Scan backwards: new items usually come from the lowest-priority
                // repository processed so far and belong at the end.
                let mut position = bucket.len();
                while position > 0
                    && comparator.priority().compare(&item, &bucket[position - 1])
                        != Ordering::Greater
                {
                    position -= 1;
                }
                bucket.insert(position, item);
                index
            }
        }
    }

    pub fn remove(&mut self, item: &ResourceItem) -> bool {
        self.remove_before(item, self.buckets.len()).is_ok()
    }

    /// Removes a batch of items.
    ///
    /// Items are processed from the highest configuration downwards so each
    /// lookup only has to search the buckets below the previous hit.
    pub fn remove_all(
        &mut self,
        items: Vec<Arc<ResourceItem>>,
        comparator: &ResourceItemComparator,
    ) -> bool {
        match items.len() {
            0 => false,
            1 => self.remove(&items[0]),
            _ => {
                let sorted = sorted_items(items, comparator);
                let mut modified = false;
                let mut end = self.buckets.len();
                for item in sorted.iter().rev() {
                    match self.remove_before(item, end) {
                        Ok(next_end) => {
                            modified = true;
                            end = next_end;
                        }
                        Err(next_end) => end = next_end,
                    }
                }
                modified
            }
        }
    }

    /// Removes `item` from the first `end` buckets.
    ///
    /// Returns `Ok` with the exclusive end of the range that can still hold
    /// lower-ordered items if the item was removed, `Err` with that same bound
    /// if it was not found.
    fn remove_before(
        &mut self,
        item: &ResourceItem,
        end: usize,
    ) -> std::result::Result<usize, usize> {
        let index = self.find_config_index(&item.configuration, 0, end)?;
        let bucket = &mut self.buckets[index];
        let Some(position) = bucket.iter().position(|candidate| **candidate == *item) else {
            return Err(index + 1);
        };
        bucket.remove(position);
        if bucket.is_empty() {
            self.buckets.remove(index);
            Ok(index)
        } else {
            Ok(index + 1)
        }
    }

    /// Removes every retained item matching `filter`, pruning empty buckets.
    pub fn remove_if<F>(&mut self, mut filter: F) -> bool
    where
        F: FnMut(&ResourceItem) -> bool,
    {
        let mut removed = false;
        for bucket in self.buckets.iter_mut() {
            let old_len = bucket.len();
            bucket.retain(|item| !filter(item.as_ref()));
            removed |= bucket.len() != old_len;
        }
        self.buckets.retain(|bucket| !bucket.is_empty());
        removed
    }

    /// Binary search for the bucket holding `config` within `[start, end)`.
    ///
    /// Returns the bucket index if found, otherwise the insertion point.
    fn find_config_index(
        &self,
        config: &FolderConfiguration,
        start: usize,
        end: usize,
    ) -> std::result::Result<usize, usize> {
        self.buckets[start..end]
            .binary_search_by(|bucket| bucket[0].configuration.cmp(config))
            .map(|index| index + start)
            .map_err(|index| index + start)
    }
}

fn sorted_items(
    mut items: Vec<Arc<ResourceItem>>,
    comparator: &ResourceItemComparator,
) -> Vec<Arc<ResourceItem>> {
    items.sort_by(|a, b| comparator.compare(a, b));
    items
}

/// Name-keyed multimap exposing at most one item per folder configuration.
#[derive(Debug, Clone)]
pub struct PerConfigResourceMap {
    map: IndexMap<String, PerConfigResourceList>,
    size: usize,
    comparator: Arc<ResourceItemComparator>,
}

impl PerConfigResourceMap {
    pub fn new(comparator: Arc<ResourceItemComparator>) -> Self {
        Self {
            map: IndexMap::new(),
            size: 0,
            comparator,
        }
    }

    /// Visible items of `name`, one per configuration.
    pub fn get<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Arc<ResourceItem>> + 'a {
        self.map.get(name).into_iter().flat_map(|list| list.iter())
    }

    /// Every retained item of `name`, shadowed ones included.
    pub fn candidates<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a Arc<ResourceItem>> + 'a {
        self.map
            .get(name)
            .into_iter()
            .flat_map(|list| list.candidates())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    /// All visible items, grouped by name.
    pub fn values(&self) -> impl Iterator<Item = &Arc<ResourceItem>> {
        self.map.values().flat_map(|list| list.iter())
    }

    /// Number of visible items.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn put(&mut self, name: &str, item: Arc<ResourceItem>) {
        let list = self.map.entry(name.to_string()).or_default();
        let old_len = list.len();
        list.add(item, &self.comparator);
        self.size = self.size + list.len() - old_len;
    }

    pub fn put_all(&mut self, name: &str, items: Vec<Arc<ResourceItem>>) -> bool {
        if items.is_empty() {
            return false;
        }
        let list = self.map.entry(name.to_string()).or_default();
        let old_len = list.len();
        let added = list.add_all(items, &self.comparator);
        self.size = self.size + list.len() - old_len;
        added
    }

    /// Adds every entry of a leaf multimap.
    pub fn put_map(&mut self, other: &ResourceMultimap) -> bool {
        for (name, items) in other.iter() {
            self.put_all(name, items.to_vec());
        }
        !other.is_empty()
    }

    pub fn remove(&mut self, name: &str, item: &ResourceItem) -> bool {
        self.update_list(name, |list, _| list.remove(item))
    }

    pub fn remove_all_items(&mut self, name: &str, items: Vec<Arc<ResourceItem>>) -> bool {
        self.update_list(name, |list, comparator| list.remove_all(items, comparator))
    }

    /// Removes the retained items of `name` matching `filter`.
    pub fn remove_if<F>(&mut self, name: &str, filter: F) -> bool
    where
        F: FnMut(&ResourceItem) -> bool,
    {
        self.update_list(name, |list, _| list.remove_if(filter))
    }

    /// Drops `name` entirely, returning the items that were visible.
    pub fn remove_key(&mut self, name: &str) -> Vec<Arc<ResourceItem>> {
        match self.map.shift_remove(name) {
            Some(list) => {
                self.size -= list.len();
                list.iter().cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Bulk replacement would bypass priority folding and is not supported.
    pub fn replace_values(
        &mut self,
        _name: &str,
        _items: Vec<Arc<ResourceItem>>,
    ) -> Result<Vec<Arc<ResourceItem>>> {
        Err(Error::UnsupportedOperation {
            operation: "replace_values on a per-configuration resource map".to_string(),
        })
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.size = 0;
    }

    /// Immutable copy of the visible items.
    pub fn to_multimap(&self) -> ResourceMultimap {
        let mut result = ResourceMultimap::new();
        for (name, list) in &self.map {
            result.put_all(name, list.iter().cloned());
        }
        result
    }

    fn update_list<F>(&mut self, name: &str, update: F) -> bool
    where
        F: FnOnce(&mut PerConfigResourceList, &ResourceItemComparator) -> bool,
    {
        let Some(list) = self.map.get_mut(name) else {
            return false;
        };
        let old_len = list.len();
        let changed = update(list, &self.comparator);
        let new_len = list.len();
        self.size = self.size + new_len - old_len;
        if new_len == 0 {
            self.map.shift_remove(name);
        }
        changed
    }
}
