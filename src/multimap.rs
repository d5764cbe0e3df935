//! Insertion-ordered multimap from resource name to resource items.
//!
//! Leaf repositories expose their content as a `ResourceMultimap`, and the
//! merge engine uses it directly for types that allow duplicate definitions.
//! It is also the shape of every query result, where it holds only the
//! visible items of a merged view.

use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::resource::ResourceItem;

/// An insertion-ordered list multimap of resource name to items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceMultimap {
    map: IndexMap<String, Vec<Arc<ResourceItem>>>,
    size: usize,
}

impl ResourceMultimap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items stored under `name`, empty if there are none.
    pub fn get(&self, name: &str) -> &[Arc<ResourceItem>] {
        self.map.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    /// All items, grouped by name in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Arc<ResourceItem>> {
        self.map.values().flatten()
    }

    /// Name and items pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &[Arc<ResourceItem>])> {
        self.map.iter().map(|(name, items)| (name, items.as_slice()))
    }

    /// Total number of items across all names.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of distinct names.
    pub fn key_count(&self) -> usize {
        self.map.len()
    }

    pub fn put(&mut self, name: impl Into<String>, item: Arc<ResourceItem>) {
        self.map.entry(name.into()).or_default().push(item);
        self.size += 1;
    }

    /// Adds the items of `name`; returns whether anything was added.
    pub fn put_all<I>(&mut self, name: &str, items: I) -> bool
    where
        I: IntoIterator<Item = Arc<ResourceItem>>,
    {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return false;
        }
        let list = self.map.entry(name.to_string()).or_default();
        let old_len = list.len();
        list.extend(items);
        self.size += list.len() - old_len;
        true
    }

    /// Adds every entry of `other`.
    pub fn put_map(&mut self, other: &ResourceMultimap) {
        for (name, items) in other.iter() {
            self.put_all(name, items.iter().cloned());
        }
    }

    /// Inserts an item keyed by its own name.
    pub fn insert_item(&mut self, item: Arc<ResourceItem>) {
        let name = item.name.clone();
        self.put(name, item);
    }

    /// Removes and returns every item stored under `name`.
    pub fn remove_all(&mut self, name: &str) -> Vec<Arc<ResourceItem>> {
        let removed = self.map.shift_remove(name).unwrap_or_default();
        self.size -= removed.len();
        removed
    }

    /// Removes the items of `name` matching `filter`, dropping the name when
    /// nothing is left. Returns whether anything was removed.
    pub fn remove_if<F>(&mut self, name: &str, mut filter: F) -> bool
    where
        F: FnMut(&ResourceItem) -> bool,
    {
        let Some(list) = self.map.get_mut(name) else {
            return false;
        };
        let old_len = list.len();
        list.retain(|item| !filter(item.as_ref()));
        let removed = old_len - list.len();
        self.size -= removed;
        if list.is_empty() {
            self.map.shift_remove(name);
        }
        removed > 0
    }

    /// Replaces the items stored under `name`, returning the previous ones.
    pub fn replace_values<I>(&mut self, name: &str, items: I) -> Vec<Arc<ResourceItem>>
    where
        I: IntoIterator<Item = Arc<ResourceItem>>,
    {
        let previous = self.remove_all(name);
        self.put_all(name, items);
        previous
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.size = 0;
    }

    /// Orders names alphabetically. Items keep their order within a name.
    pub fn sort_names(&mut self) {
        self.map.sort_keys();
    }

    /// Sets the items of `name` in a map whose names are sorted, keeping the
    /// names sorted. An empty `items` removes the name.
    pub fn set_sorted(&mut self, name: &str, items: Vec<Arc<ResourceItem>>) {
        let added = items.len();
        let previous = if items.is_empty() {
            self.map.shift_remove(name)
        } else {
            self.map.insert_sorted(name.to_string(), items).1
        };
        self.size = self.size + added - previous.map_or(0, |items| items.len());
    }

    /// Stable sort of the items of `name`.
    pub fn sort_values_by<F>(&mut self, name: &str, compare: F)
    where
        F: FnMut(&Arc<ResourceItem>, &Arc<ResourceItem>) -> Ordering,
    {
        if let Some(list) = self.map.get_mut(name) {
            list.sort_by(compare);
        }
    }
}

impl FromIterator<Arc<ResourceItem>> for ResourceMultimap {
    fn from_iter<T: IntoIterator<Item = Arc<ResourceItem>>>(iter: T) -> Self {
        let mut map = ResourceMultimap::new();
        for item in iter {
            map.insert_item(item);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{FolderConfiguration, RepositoryId, ResourceNamespace, ResourceType};

    fn item(name: &str, value: &str) -> Arc<ResourceItem> {
        Arc::new(
            ResourceItem::new(
                RepositoryId::next(),
                ResourceNamespace::res_auto(),
                ResourceType::Id,
                name,
                FolderConfiguration::default(),
            )
            .with_value(value),
        )
    }

    #[test]
    fn test_put_keeps_insertion_order_and_duplicates() {
        let mut map = ResourceMultimap::new();
        map.put("b", item("b", "1"));
        map.put("a", item("a", "2"));
        map.put("b", item("b", "3"));

        assert_eq!(map.len(), 3);
        assert_eq!(map.key_count(), 2);
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(map.get("b").len(), 2);
        assert!(map.get("missing").is_empty());
    }

    #[test]
    fn test_put_all_with_empty_iterator_adds_nothing() {
        let mut map = ResourceMultimap::new();
        assert!(!map.put_all("x", Vec::new()));
        assert!(!map.contains_key("x"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_remove_if_drops_empty_names() {
        let mut map = ResourceMultimap::new();
        map.put("a", item("a", "keep"));
        map.put("a", item("a", "drop"));
        map.put("b", item("b", "drop"));

        assert!(map.remove_if("a", |i| i.value.as_deref() == Some("drop")));
        assert!(map.remove_if("b", |i| i.value.as_deref() == Some("drop")));
        assert!(!map.remove_if("c", |_| true));

        assert_eq!(map.len(), 1);
        assert!(!map.contains_key("b"));
        assert_eq!(map.get("a")[0].value.as_deref(), Some("keep"));
    }

    #[test]
    fn test_replace_values_returns_previous_items() {
        let mut map = ResourceMultimap::new();
        map.put("a", item("a", "old"));
        let previous = map.replace_values("a", vec![item("a", "new1"), item("a", "new2")]);
        assert_eq!(previous.len(), 1);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a")[1].value.as_deref(), Some("new2"));
    }

    #[test]
    fn test_set_sorted_keeps_names_sorted() {
        let mut map = ResourceMultimap::new();
        map.put("c", item("c", "1"));
        map.put("a", item("a", "2"));
        map.sort_names();

        map.set_sorted("b", vec![item("b", "3"), item("b", "4")]);
        map.set_sorted("a", vec![item("a", "5")]);
        map.set_sorted("c", Vec::new());

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("a")[0].value.as_deref(), Some("5"));
    }

    #[test]
    fn test_sort_values_by_is_stable() {
        let mut map = ResourceMultimap::new();
        for value in ["b1", "a1", "b2", "a2"] {
            map.put("x", item("x", value));
        }
        let letter = |item: &Arc<ResourceItem>| item.value.as_deref().map(|v| v[..1].to_string());
        map.sort_values_by("x", |a, b| letter(a).cmp(&letter(b)));
        let values: Vec<_> = map
            .get("x")
            .iter()
            .filter_map(|i| i.value.clone())
            .collect();
        assert_eq!(values, vec!["a1", "a2", "b1", "b2"]);
    }

    #[test]
    fn test_put_map_and_from_iterator() {
        let source: ResourceMultimap = vec![item("a", "1"), item("b", "2"), item("a", "3")]
            .into_iter()
            .collect();
        let mut target = ResourceMultimap::new();
        target.put_map(&source);
        assert_eq!(target, source);
        assert_eq!(target.values().count(), 3);
    }
}
