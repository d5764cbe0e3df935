//! # Tree Command Implementation
//!
//! Prints the repository tree of a manifest with `ptree`. Children are shown
//! in priority order, so the first leaf of a namespace is the one whose
//! items win.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::path::PathBuf;

use resource_merge::defaults::{DEFAULT_MANIFEST, MANIFEST_ENV};
use resource_merge::multi::MultiResourceRepository;
use resource_merge::repository::{RepositoryNode, SingleNamespaceRepository};
use resource_merge::resource::ResourceType;

/// Display the repository tree of a manifest
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Path to the manifest describing the repository tree.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST, env = MANIFEST_ENV)]
    pub manifest: PathBuf,

    /// Maximum depth of the tree to display.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs) -> Result<()> {
    let tree = super::load_tree(&args.manifest)?;
    println!("Repository tree for: {}", args.manifest.display());

    let tree_root = composite_node(&tree.root, args.depth.unwrap_or(usize::MAX), 0);
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

fn composite_node(multi: &MultiResourceRepository, max_depth: usize, depth: usize) -> TreeNode {
    let label = match multi.namespace() {
        Some(namespace) => format!("{} (composite, {})", multi.display_name(), namespace),
        None => format!("{} (composite)", multi.display_name()),
    };
    let children = if depth >= max_depth {
        Vec::new()
    } else {
        multi
            .children()
            .iter()
            .map(|child| child_node(child, max_depth, depth + 1))
            .collect()
    };
    TreeNode { label, children }
}

fn child_node(node: &RepositoryNode, max_depth: usize, depth: usize) -> TreeNode {
    match node {
        RepositoryNode::Leaf(leaf) => leaf_node(leaf.as_ref()),
        RepositoryNode::Composite(multi) => composite_node(multi, max_depth, depth),
        RepositoryNode::Opaque(other) => {
            let children = if depth >= max_depth {
                Vec::new()
            } else {
                other
                    .leaf_repositories()
                    .iter()
                    .map(|leaf| leaf_node(leaf.as_ref()))
                    .collect()
            };
            TreeNode {
                label: format!("{} (bundle)", other.display_name()),
                children,
            }
        }
    }
}

fn leaf_node(leaf: &dyn SingleNamespaceRepository) -> TreeNode {
    let items: usize = ResourceType::ALL
        .iter()
        .map(|resource_type| leaf.resources(leaf.namespace(), *resource_type).len())
        .sum();
    TreeNode {
        label: format!(
            "{} ({}, {} item{})",
            leaf.display_name(),
            leaf.namespace(),
            items,
            if items == 1 { "" } else { "s" }
        ),
        children: Vec::new(),
    }
}

#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
