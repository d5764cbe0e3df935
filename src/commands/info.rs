//! # Info Command Implementation
//!
//! Shows an overview of the repository tree of a manifest: the namespaces it
//! provides, the priority order of its leaves, the number of visible items
//! per namespace and the modification count of the root.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use resource_merge::defaults::{DEFAULT_MANIFEST, MANIFEST_ENV};
use resource_merge::multi::MultiResourceRepository;
use resource_merge::output::{marker, OutputConfig};
use resource_merge::repository::SingleNamespaceRepository;
use resource_merge::resource::{ResourceNamespace, ResourceType};

/// Show an overview of a manifest's repository tree
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the manifest describing the repository tree.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST, env = MANIFEST_ENV)]
    pub manifest: PathBuf,
}

/// Execute the `info` command.
pub fn execute(args: InfoArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let tree = super::load_tree(&args.manifest)?;
    let root = &tree.root;

    println!(
        "{} Manifest: {}",
        marker(&out, "📋", "[INFO]"),
        args.manifest.display()
    );
    println!();

    println!("{}", out.heading("Namespaces:"));
    for namespace in root.namespaces() {
        println!(
            "   {} ({} visible items)",
            namespace,
            visible_items(root, &namespace)
        );
    }
    println!();

    println!("{}", out.heading("Leaf priority order:"));
    for (position, leaf) in root.leaf_resource_repositories().iter().enumerate() {
        println!(
            "   {}. {} {}",
            position + 1,
            leaf.display_name(),
            out.detail(&format!("({})", leaf.namespace()))
        );
    }
    println!();

    println!("Modification count: {}", root.modification_count());
    Ok(())
}

fn visible_items(root: &MultiResourceRepository, namespace: &ResourceNamespace) -> usize {
    ResourceType::ALL
        .iter()
        .map(|resource_type| root.get_map(namespace, *resource_type).len())
        .sum()
}
