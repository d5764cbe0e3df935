//! # Resource Merge Library
//!
//! This library combines layered resource repositories into a single merged
//! view. Leaves hold resource items; composites stack leaves (and other
//! composites) in priority order and answer queries with the items that win.
//! The `resource-merge` command-line tool loads such trees from YAML
//! manifests, but the library can be driven directly.
//!
//! ## Quick Example
//!
//! ```
//! use resource_merge::memory::MemoryResourceRepository;
//! use resource_merge::multi::MultiResourceRepository;
//! use resource_merge::repository::ItemMapLock;
//! use resource_merge::resource::{FolderConfiguration, ResourceNamespace, ResourceType};
//!
//! let lock = ItemMapLock::new();
//! let app = MemoryResourceRepository::with_lock("app", ResourceNamespace::res_auto(), &lock);
//! let lib = MemoryResourceRepository::with_lock("lib", ResourceNamespace::res_auto(), &lock);
//! let default = FolderConfiguration::default();
//! app.add_item(app.new_item(ResourceType::String, "title", default.clone()).with_value("App"));
//! lib.add_item(lib.new_item(ResourceType::String, "title", default.clone()).with_value("Lib"));
//! lib.add_item(lib.new_item(ResourceType::String, "ok", default).with_value("OK"));
//!
//! let root = MultiResourceRepository::with_lock("root", &lock);
//! root.set_children(vec![app.clone().into(), lib.clone().into()], vec![], vec![])
//!     .unwrap();
//!
//! let strings = root.get_map(&ResourceNamespace::res_auto(), ResourceType::String);
//! assert_eq!(strings.get("title")[0].value.as_deref(), Some("App"));
//! assert_eq!(strings.get("ok")[0].value.as_deref(), Some("OK"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Resources (`resource`, `multimap`)**: namespaces, resource types,
//!   folder configurations, items and the name-keyed multimap leaves expose.
//! - **Priority (`priority`)**: ordering of items by configuration and by the
//!   position of the leaf that provides them.
//! - **Per-configuration maps (`per_config`)**: merged maps that only keep
//!   the winning item of every (name, configuration) pair visible.
//! - **Repositories (`repository`, `memory`, `library`)**: the traits of the
//!   tree and the concrete leaves.
//! - **Composites (`multi`, `topology`, `merge_cache`)**: the composite
//!   repository, the flattening of its children and its cache of merged maps.
//! - **Manifests (`config`)**: the YAML description of a tree.
//!
//! ## Invalidation
//!
//! Changing the children of a composite resets its caches and those of every
//! ancestor. Changing the items of a leaf only marks the leaf as unreconciled
//! in the merged maps that contain it; the next query patches those maps
//! instead of merging them again from scratch.

pub mod config;
pub mod defaults;
pub mod error;
pub mod library;
pub mod memory;
pub mod merge_cache;
pub mod multi;
pub mod multimap;
pub mod output;
pub mod per_config;
pub mod priority;
pub mod repository;
pub mod resource;
pub mod suggestions;
pub mod topology;
pub mod visitor;

#[cfg(test)]
mod merge_proptest;
