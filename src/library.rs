//! Read-only repositories: prebuilt libraries and bundles of libraries.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::multimap::ResourceMultimap;
use crate::repository::{ResourceRepository, SingleNamespaceRepository};
use crate::resource::{RepositoryId, ResourceItem, ResourceNamespace, ResourceType};

/// An immutable single-namespace leaf, such as an unpacked library archive.
#[derive(Debug)]
pub struct LibraryResourceRepository {
    id: RepositoryId,
    name: String,
    namespace: ResourceNamespace,
    maps: HashMap<ResourceType, Arc<ResourceMultimap>>,
}

impl LibraryResourceRepository {
    /// Creates a library holding `items`.
    ///
    /// Items are adopted: their namespace and repository are rewritten to
    /// those of the new library.
    pub fn new(
        name: impl Into<String>,
        namespace: ResourceNamespace,
        items: Vec<ResourceItem>,
    ) -> Self {
        let id = RepositoryId::next();
        let mut maps: HashMap<ResourceType, ResourceMultimap> = HashMap::new();
        for mut item in items {
            item.repository = id;
            item.namespace = namespace.clone();
            maps.entry(item.resource_type)
                .or_default()
                .insert_item(Arc::new(item));
        }
        Self {
            id,
            name: name.into(),
            namespace,
            maps: maps.into_iter().map(|(ty, map)| (ty, Arc::new(map))).collect(),
        }
    }

    /// Total number of items.
    pub fn len(&self) -> usize {
        self.maps.values().map(|map| map.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SingleNamespaceRepository for LibraryResourceRepository {
    fn id(&self) -> RepositoryId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
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
            .get(&resource_type)
            .cloned()
            .unwrap_or_default()
    }
}

/// A named group of libraries that may span several namespaces.
#[derive(Debug)]
pub struct LibraryBundle {
    name: String,
    libraries: Vec<Arc<LibraryResourceRepository>>,
}

impl LibraryBundle {
    pub fn new(name: impl Into<String>, libraries: Vec<Arc<LibraryResourceRepository>>) -> Self {
        Self {
            name: name.into(),
            libraries,
        }
    }

    pub fn libraries(&self) -> &[Arc<LibraryResourceRepository>] {
        &self.libraries
    }
}

impl ResourceRepository for LibraryBundle {
    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn namespaces(&self) -> BTreeSet<ResourceNamespace> {
        self.libraries
            .iter()
            .map(|library| library.namespace().clone())
            .collect()
    }

    fn leaf_repositories(&self) -> Vec<Arc<dyn SingleNamespaceRepository>> {
        self.libraries
            .iter()
            .map(|library| library.clone() as Arc<dyn SingleNamespaceRepository>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FolderConfiguration;

    fn item(resource_type: ResourceType, name: &str) -> ResourceItem {
        ResourceItem::new(
            RepositoryId::next(),
            ResourceNamespace::res_auto(),
            resource_type,
            name,
            FolderConfiguration::default(),
        )
    }

    #[test]
    fn test_library_adopts_items() {
        let library = LibraryResourceRepository::new(
            "appcompat",
            "androidx".into(),
            vec![item(ResourceType::String, "ok"), item(ResourceType::Color, "accent")],
        );
        let strings = library.resources(&"androidx".into(), ResourceType::String);
        assert_eq!(strings.len(), 1);
        let adopted = &strings.get("ok")[0];
        assert_eq!(adopted.repository, library.id());
        assert_eq!(adopted.namespace.as_str(), "androidx");
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_library_ignores_other_namespaces() {
        let library = LibraryResourceRepository::new(
            "appcompat",
            "androidx".into(),
            vec![item(ResourceType::String, "ok")],
        );
        assert!(library
            .resources(&ResourceNamespace::res_auto(), ResourceType::String)
            .is_empty());
        assert!(library
            .resources(&"androidx".into(), ResourceType::Layout)
            .is_empty());
    }

    #[test]
    fn test_bundle_reports_namespaces_of_its_libraries() {
        let bundle = LibraryBundle::new(
            "sdk",
            vec![
                Arc::new(LibraryResourceRepository::new("core", "android".into(), vec![])),
                Arc::new(LibraryResourceRepository::new("compat", "androidx".into(), vec![])),
            ],
        );
        let namespaces: Vec<String> = bundle.namespaces().iter().map(|ns| ns.to_string()).collect();
        assert_eq!(namespaces, vec!["android", "androidx"]);
        assert_eq!(bundle.leaf_repositories().len(), 2);
    }
}
