//! # Ls Command Implementation
//!
//! Lists the visible items of the merged view of a manifest: one line per
//! item that survives priority folding.
//!
//! ## Functionality
//!
//! - **Filtering**: by namespace, resource type and a glob on the name
//! - **Long format**: adds the value and the repository that provides it
//! - **JSON**: machine-readable output with `--json`
//! - **Count**: only the number of matching items with `--count`

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use resource_merge::defaults::{DEFAULT_MANIFEST, MANIFEST_ENV};
use resource_merge::output::OutputConfig;
use resource_merge::repository::SingleNamespaceRepository;
use resource_merge::resource::{RepositoryId, ResourceItem, ResourceNamespace, ResourceType};
use resource_merge::suggestions;
use resource_merge::visitor::CollectingVisitor;

/// List the visible resources of the merged view
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Path to the manifest describing the repository tree.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST, env = MANIFEST_ENV)]
    pub manifest: PathBuf,

    /// Only list resources of this namespace (e.g. "res-auto").
    #[arg(short, long, value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Only list resources of this type (e.g. "string", "drawable").
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub resource_type: Option<String>,

    /// Filter resource names by glob pattern (e.g. "app_*").
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Show values and the repository providing each item.
    #[arg(short, long)]
    pub long: bool,

    /// Print the items as JSON.
    #[arg(long, conflicts_with_all = ["count", "long"])]
    pub json: bool,

    /// Show only the number of matching items.
    #[arg(long)]
    pub count: bool,
}

#[derive(Debug, Serialize)]
struct ListedItem<'a> {
    namespace: &'a str,
    #[serde(rename = "type")]
    resource_type: ResourceType,
    name: &'a str,
    config: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    repository: &'a str,
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let tree = super::load_tree(&args.manifest)?;
    let root = &tree.root;

    let mut visitor = CollectingVisitor::new();
    if let Some(namespace) = &args.namespace {
        let available: Vec<ResourceNamespace> = root.namespaces().into_iter().collect();
        let namespace = ResourceNamespace::new(namespace.as_str());
        if !available.contains(&namespace) {
            return Err(suggestions::unknown_namespace(namespace.as_str(), &available));
        }
        visitor = visitor.namespace(namespace);
    }
    if let Some(resource_type) = &args.resource_type {
        let resource_type: ResourceType = resource_type
            .parse()
            .map_err(|_| suggestions::unknown_resource_type(resource_type))?;
        visitor = visitor.types(vec![resource_type]);
    }
    root.accept(&mut visitor);

    let mut items = visitor.items;
    if let Some(pattern) = &args.pattern {
        let glob_pattern =
            glob::Pattern::new(pattern).map_err(|e| suggestions::invalid_glob(pattern, &e))?;
        items.retain(|item| glob_pattern.matches(&item.name));
    }

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }

    let repositories: HashMap<RepositoryId, String> = root
        .leaf_resource_repositories()
        .iter()
        .map(|leaf| (leaf.id(), leaf.display_name()))
        .collect();
    let repository_of = |item: &Arc<ResourceItem>| -> String {
        repositories
            .get(&item.repository)
            .cloned()
            .unwrap_or_else(|| item.repository.to_string())
    };

    if args.json {
        let names: Vec<String> = items.iter().map(|item| repository_of(item)).collect();
        let listed: Vec<ListedItem<'_>> = items
            .iter()
            .zip(&names)
            .map(|(item, repository)| listed_item(item, repository))
            .collect();
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No resources found");
        return Ok(());
    }
    for item in &items {
        println!("{}", format_item(&out, item, args.long.then(|| repository_of(item))));
    }
    Ok(())
}

fn listed_item<'a>(item: &'a Arc<ResourceItem>, repository: &'a str) -> ListedItem<'a> {
    ListedItem {
        namespace: item.namespace.as_str(),
        resource_type: item.resource_type,
        name: &item.name,
        config: item.configuration.to_string(),
        value: item.value.as_deref(),
        repository,
    }
}

/// One output line: the reference and configuration, plus value and
/// repository in long format.
fn format_item(out: &OutputConfig, item: &ResourceItem, repository: Option<String>) -> String {
    let mut line = format!(
        "{} {}",
        item.reference(),
        out.detail(&format!("[{}]", item.configuration))
    );
    if let Some(repository) = repository {
        if let Some(value) = &item.value {
            line.push_str(&format!(" = {:?}", value));
        }
        line.push_str(&format!(" ({})", repository));
    }
    line
}
