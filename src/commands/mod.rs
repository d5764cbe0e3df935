//! # CLI Command Implementations
//!
//! Each subcommand of the `resource-merge` tool lives in its own file and
//! typically contains:
//! - An `Args` struct that defines the command-specific arguments, derived
//!   using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command by calling into the `resource_merge` library.

pub mod completions;
pub mod info;
pub mod ls;
pub mod tree;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use resource_merge::config::{self, ResourceTree};
use resource_merge::defaults::ROOT_NAME;
use resource_merge::suggestions;

/// Loads the manifest at `path` and builds its repository tree.
pub fn load_tree(path: &Path) -> Result<ResourceTree> {
    if !path.exists() {
        return Err(suggestions::manifest_not_found(path));
    }
    let schema = config::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load manifest from {}: {}", path.display(), e))?;
    config::build_tree(&schema, ROOT_NAME)
        .map_err(|e| anyhow::anyhow!("Failed to build repository tree: {}", e))
}
