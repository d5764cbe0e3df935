//! # Manifest Parsing and Tree Construction
//!
//! A manifest is a YAML list of nodes describing a repository tree together
//! with the pre-parsed items of its leaves:
//!
//! ```yaml
//! - leaf:
//!     name: main
//!     namespace: res-auto
//!     resources:
//!       - { type: string, name: app_name, value: "My App" }
//!       - { type: string, name: app_name, config: fr, value: "Mon App" }
//! - composite:
//!     name: feature
//!     children:
//!       - leaf: { name: feature_main }
//! - library:
//!     name: appcompat
//!     namespace: androidx.appcompat
//! - bundle:
//!     name: sdk
//!     libraries:
//!       - { name: framework, namespace: android }
//! ```
//!
//! Node order is priority order. Leaves and composites become local children
//! of their parent, libraries become library children and bundles become
//! opaque children.
//!
//! [`parse`] turns YAML into a [`Schema`], [`check`] reports problems that
//! parsing alone does not catch, and [`build_tree`] creates the repositories.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::library::{LibraryBundle, LibraryResourceRepository};
use crate::memory::MemoryResourceRepository;
use crate::multi::MultiResourceRepository;
use crate::repository::{
    ItemMapLock, LocalRepository, ResourceRepository, SingleNamespaceRepository,
};
use crate::resource::{
    FolderConfiguration, RepositoryId, ResourceItem, ResourceNamespace, ResourceType,
};
use crate::suggestions::find_similar;

/// Names of resources must look like identifiers.
pub const RESOURCE_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_.]*$";

/// Node kinds a manifest may contain.
pub const NODE_KINDS: [&str; 4] = ["leaf", "library", "composite", "bundle"];

/// A single item of a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    /// Folder configuration qualifiers, `default` when omitted.
    #[serde(default)]
    pub config: FolderConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ResourceEntry {
    /// Unadopted item for this entry.
    pub fn to_item(&self, namespace: &ResourceNamespace) -> ResourceItem {
        let item = ResourceItem::new(
            RepositoryId::UNASSIGNED,
            namespace.clone(),
            self.resource_type,
            self.name.clone(),
            self.config.clone(),
        );
        match &self.value {
            Some(value) => item.with_value(value.clone()),
            None => item,
        }
    }
}

/// Body of a `leaf` or `library` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafNode {
    pub name: String,
    #[serde(default = "ResourceNamespace::res_auto")]
    pub namespace: ResourceNamespace,
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

impl LeafNode {
    pub fn items(&self) -> Vec<ResourceItem> {
        self.resources
            .iter()
            .map(|entry| entry.to_item(&self.namespace))
            .collect()
    }
}

/// Body of a `composite` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeNode {
    pub name: String,
    /// Restricts every leaf below to this namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<ResourceNamespace>,
    #[serde(default)]
    pub children: Vec<Node>,
}

/// Body of a `bundle` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleNode {
    pub name: String,
    #[serde(default)]
    pub libraries: Vec<LeafNode>,
}

/// A node of the repository tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// A mutable local leaf.
    Leaf { leaf: LeafNode },
    /// An immutable single-namespace leaf.
    Library { library: LeafNode },
    /// A nested composite repository.
    Composite { composite: CompositeNode },
    /// A group of libraries that may span several namespaces.
    Bundle { bundle: BundleNode },
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Leaf { leaf } => &leaf.name,
            Node::Library { library } => &library.name,
            Node::Composite { composite } => &composite.name,
            Node::Bundle { bundle } => &bundle.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Leaf { .. } => "leaf",
            Node::Library { .. } => "library",
            Node::Composite { .. } => "composite",
            Node::Bundle { .. } => "bundle",
        }
    }
}

/// The complete manifest: top-level nodes in priority order.
pub type Schema = Vec<Node>;

/// Parse a manifest from a YAML string.
///
/// When the YAML does not describe a valid tree, the error names the first
/// offending node and, where possible, how to fix it.
pub fn parse(yaml_content: &str) -> Result<Schema> {
    match serde_yaml::from_str::<Schema>(yaml_content) {
        Ok(schema) => Ok(schema),
        Err(e) => {
            let raw: serde_yaml::Value = serde_yaml::from_str(yaml_content).map_err(Error::Yaml)?;
            Err(diagnose(&raw, "").unwrap_or(Error::Yaml(e)))
        }
    }
}

/// Parse a manifest from a file
pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Schema> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Finds the first node of `value` that cannot be deserialized.
fn diagnose(value: &serde_yaml::Value, location: &str) -> Option<Error> {
    use serde_yaml::Value;

    let Value::Sequence(nodes) = value else {
        return Some(Error::ConfigParse {
            message: format!("Expected a list of nodes{}", at(location)),
            hint: Some(
                "Start each node with '- leaf:', '- library:', '- composite:' or '- bundle:'"
                    .to_string(),
            ),
        });
    };

    for (index, node) in nodes.iter().enumerate() {
        let here = format!("{}[{}]", location, index);
        let Value::Mapping(map) = node else {
            return Some(Error::ConfigParse {
                message: format!("Expected a mapping for node{}", at(&here)),
                hint: None,
            });
        };
        if map.len() != 1 {
            return Some(Error::ConfigParse {
                message: format!(
                    "Node{} must have exactly one key, found {}",
                    at(&here),
                    map.len()
                ),
                hint: Some(format!("Use one of: {}", NODE_KINDS.join(", "))),
            });
        }
        let Some((Value::String(kind), body)) = map.iter().next() else {
            return Some(Error::ConfigParse {
                message: format!("Node kind{} must be a string", at(&here)),
                hint: None,
            });
        };
        if !NODE_KINDS.contains(&kind.as_str()) {
            let hint = match find_similar(kind, &NODE_KINDS) {
                Some(similar) => format!("Did you mean '{}'?", similar),
                None => format!("Use one of: {}", NODE_KINDS.join(", ")),
            };
            return Some(Error::ConfigParse {
                message: format!("Unknown node kind '{}'{}", kind, at(&here)),
                hint: Some(hint),
            });
        }

        let here = format!("{}.{}", here, kind);
        if kind == "composite" {
            if let Some(children) = body.get("children") {
                if let Some(error) = diagnose(children, &format!("{}.children", here)) {
                    return Some(error);
                }
            }
        }
        let single = Value::Sequence(vec![node.clone()]);
        if let Err(e) = serde_yaml::from_value::<Schema>(single) {
            let detail = body_error(kind, body).unwrap_or_else(|| e.to_string());
            return Some(Error::ConfigParse {
                message: format!("Invalid {} node{}: {}", kind, at(&here), detail),
                hint: Some(match kind.as_str() {
                    "composite" => "A composite needs 'name' and may have 'namespace' and 'children'",
                    "bundle" => "A bundle needs 'name' and a list of 'libraries'",
                    _ => "A leaf needs 'name' and may have 'namespace' and 'resources'",
                }
                .to_string()),
            });
        }
    }
    None
}

/// Deserializes the body alone, which gives a more precise message than the
/// untagged node enum does.
fn body_error(kind: &str, body: &serde_yaml::Value) -> Option<String> {
    let result = match kind {
        "leaf" | "library" => serde_yaml::from_value::<LeafNode>(body.clone()).map(|_| ()),
        "bundle" => serde_yaml::from_value::<BundleNode>(body.clone()).map(|_| ()),
        _ => return None,
    };
    result.err().map(|e| e.to_string())
}

fn at(location: &str) -> String {
    if location.is_empty() {
        String::new()
    } else {
        format!(" at {}", location)
    }
}

/// How serious a manifest [`Issue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found by [`check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    /// Name of the repository the issue belongs to.
    pub repository: String,
    pub message: String,
}

/// Reports manifest problems that deserialization does not catch.
///
/// Errors: invalid resource names, repository names used twice. Warnings:
/// empty leaves and composites, and items defined twice for the same
/// configuration within one leaf.
pub fn check(schema: &Schema) -> Result<Vec<Issue>> {
    let pattern = Regex::new(RESOURCE_NAME_PATTERN)?;
    let mut issues = Vec::new();
    let mut names = HashSet::new();
    check_nodes(schema, &pattern, &mut names, &mut issues);
    Ok(issues)
}

fn check_nodes(
    nodes: &[Node],
    pattern: &Regex,
    names: &mut HashSet<String>,
    issues: &mut Vec<Issue>,
) {
    for node in nodes {
        if !names.insert(node.name().to_string()) {
            issues.push(Issue {
                severity: Severity::Error,
                repository: node.name().to_string(),
                message: "repository name is used more than once".to_string(),
            });
        }
        match node {
            Node::Leaf { leaf } | Node::Library { library: leaf } => {
                check_leaf(leaf, pattern, issues);
            }
            Node::Composite { composite } => {
                if composite.children.is_empty() {
                    issues.push(Issue {
                        severity: Severity::Warning,
                        repository: composite.name.clone(),
                        message: "composite has no children".to_string(),
                    });
                }
                check_nodes(&composite.children, pattern, names, issues);
            }
            Node::Bundle { bundle } => {
                for library in &bundle.libraries {
                    if !names.insert(library.name.clone()) {
                        issues.push(Issue {
                            severity: Severity::Error,
                            repository: library.name.clone(),
                            message: "repository name is used more than once".to_string(),
                        });
                    }
                    check_leaf(library, pattern, issues);
                }
            }
        }
    }
}

fn check_leaf(leaf: &LeafNode, pattern: &Regex, issues: &mut Vec<Issue>) {
    if leaf.resources.is_empty() {
        issues.push(Issue {
            severity: Severity::Warning,
            repository: leaf.name.clone(),
            message: "leaf has no resources".to_string(),
        });
    }
    let mut seen: HashMap<(ResourceType, &str, &FolderConfiguration), usize> = HashMap::new();
    for entry in &leaf.resources {
        if !pattern.is_match(&entry.name) {
            issues.push(Issue {
                severity: Severity::Error,
                repository: leaf.name.clone(),
                message: format!("invalid resource name '{}'", entry.name),
            });
        }
        let count = seen
            .entry((entry.resource_type, entry.name.as_str(), &entry.config))
            .or_insert(0);
        *count += 1;
        if *count == 2 && !entry.resource_type.allows_duplicates() {
            issues.push(Issue {
                severity: Severity::Warning,
                repository: leaf.name.clone(),
                message: format!(
                    "@{}/{} is defined more than once for configuration '{}'",
                    entry.resource_type, entry.name, entry.config
                ),
            });
        }
    }
}

/// A repository tree built from a manifest.
#[derive(Debug)]
pub struct ResourceTree {
    pub root: Arc<MultiResourceRepository>,
    leaves: IndexMap<String, Arc<MemoryResourceRepository>>,
}

impl ResourceTree {
    /// The local leaf called `name`.
    pub fn leaf(&self, name: &str) -> Option<&Arc<MemoryResourceRepository>> {
        self.leaves.get(name)
    }

    /// Local leaves in manifest order.
    pub fn leaves(&self) -> impl Iterator<Item = (&String, &Arc<MemoryResourceRepository>)> {
        self.leaves.iter()
    }
}

enum Built {
    Local(LocalRepository),
    Library(Arc<dyn SingleNamespaceRepository>),
    Other(Arc<dyn ResourceRepository>),
}

type BuiltNode = (Built, Vec<(String, Arc<MemoryResourceRepository>)>);

/// Creates the repositories described by `schema` under a root composite
/// called `root_name`. Sibling nodes are built in parallel.
pub fn build_tree(schema: &Schema, root_name: &str) -> Result<ResourceTree> {
    let lock = ItemMapLock::new();
    let root = MultiResourceRepository::with_lock(root_name, &lock);
    let mut leaves = IndexMap::new();
    let (local, libraries, others) = build_children(schema, &lock, &mut leaves)?;
    root.set_children(local, libraries, others)?;
    Ok(ResourceTree { root, leaves })
}

type Children = (
    Vec<LocalRepository>,
    Vec<Arc<dyn SingleNamespaceRepository>>,
    Vec<Arc<dyn ResourceRepository>>,
);

fn build_children(
    nodes: &[Node],
    lock: &ItemMapLock,
    leaves: &mut IndexMap<String, Arc<MemoryResourceRepository>>,
) -> Result<Children> {
    let built: Vec<BuiltNode> = nodes
        .par_iter()
        .map(|node| build_node(node, lock))
        .collect::<Result<Vec<_>>>()?;

    let mut local = Vec::new();
    let mut libraries = Vec::new();
    let mut others = Vec::new();
    for (node, node_leaves) in built {
        for (name, leaf) in node_leaves {
            if leaves.insert(name.clone(), leaf).is_some() {
                return Err(Error::ConfigParse {
                    message: format!("Leaf name '{}' is used more than once", name),
                    hint: Some("Give every leaf a unique name".to_string()),
                });
            }
        }
        match node {
            Built::Local(repository) => local.push(repository),
            Built::Library(library) => libraries.push(library),
            Built::Other(other) => others.push(other),
        }
    }
    Ok((local, libraries, others))
}

fn build_node(node: &Node, lock: &ItemMapLock) -> Result<BuiltNode> {
    match node {
        Node::Leaf { leaf } => {
            let repository =
                MemoryResourceRepository::with_lock(&leaf.name, leaf.namespace.clone(), lock);
            repository.add_items(leaf.items());
            Ok((
                Built::Local(repository.clone().into()),
                vec![(leaf.name.clone(), repository)],
            ))
        }
        Node::Library { library } => Ok((
            Built::Library(Arc::new(build_library(library))),
            Vec::new(),
        )),
        Node::Composite { composite } => {
            let multi = match &composite.namespace {
                Some(namespace) => MultiResourceRepository::with_namespace(
                    &composite.name,
                    namespace.clone(),
                    lock,
                ),
                None => MultiResourceRepository::with_lock(&composite.name, lock),
            };
            let mut nested = IndexMap::new();
            let (local, libraries, others) =
                build_children(&composite.children, lock, &mut nested)?;
            multi.set_children(local, libraries, others)?;
            Ok((
                Built::Local(LocalRepository::Multi(multi)),
                nested.into_iter().collect(),
            ))
        }
        Node::Bundle { bundle } => {
            let libraries = bundle
                .libraries
                .iter()
                .map(|library| Arc::new(build_library(library)))
                .collect();
            Ok((
                Built::Other(Arc::new(LibraryBundle::new(&bundle.name, libraries))),
                Vec::new(),
            ))
        }
    }
}

fn build_library(library: &LeafNode) -> LibraryResourceRepository {
    LibraryResourceRepository::new(&library.name, library.namespace.clone(), library.items())
}
