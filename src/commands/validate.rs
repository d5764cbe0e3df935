//! # Validate Command Implementation
//!
//! Validates a manifest without printing its merged view.
//!
//! ## Functionality
//!
//! - **Parsing**: the manifest must describe a list of valid nodes.
//! - **Manifest checks**: resource names, duplicate repository names, empty
//!   leaves and composites.
//! - **Tree construction**: the tree is built, which rejects children that
//!   are inconsistent with their composite (foreign namespaces, for example).
//!
//! With `--strict`, warnings fail the validation too.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use resource_merge::config::{self, Severity};
use resource_merge::defaults::{DEFAULT_MANIFEST, MANIFEST_ENV, ROOT_NAME};
use resource_merge::output::{marker, OutputConfig};
use resource_merge::suggestions;

/// Validate a manifest
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the manifest to validate.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST, env = MANIFEST_ENV)]
    pub manifest: PathBuf,

    /// Use strict validation (fail on warnings).
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let manifest = &args.manifest;
    println!(
        "{} Validating manifest: {}",
        marker(&out, "🔍", "[SCAN]"),
        manifest.display()
    );

    if !manifest.exists() {
        return Err(suggestions::manifest_not_found(manifest));
    }

    let schema = match config::from_file(manifest) {
        Ok(schema) => {
            println!("{} Manifest parsed successfully", marker(&out, "✅", "[OK]"));
            schema
        }
        Err(e) => {
            println!("{} Manifest parsing failed: {}", marker(&out, "❌", "[ERR]"), e);
            return Err(anyhow::anyhow!("Manifest parsing failed: {}", e));
        }
    };

    let issues = config::check(&schema)?;
    let errors = issues
        .iter()
        .filter(|issue| issue.severity == Severity::Error)
        .count();
    let warnings = issues.len() - errors;
    for issue in &issues {
        let (symbol, plain) = match issue.severity {
            Severity::Error => ("❌", "[ERR]"),
            Severity::Warning => ("⚠️ ", "[WARN]"),
        };
        println!(
            "{} {}: {}",
            marker(&out, symbol, plain),
            issue.repository,
            issue.message
        );
    }

    let tree_error = match config::build_tree(&schema, ROOT_NAME) {
        Ok(tree) => {
            println!(
                "{} Repository tree built: {} leaves in {} namespaces",
                marker(&out, "✅", "[OK]"),
                tree.root.leaf_resource_repositories().len(),
                tree.root.namespaces().len()
            );
            false
        }
        Err(e) => {
            println!("{} {}", marker(&out, "❌", "[ERR]"), e);
            true
        }
    };

    println!();
    if errors > 0 || tree_error {
        anyhow::bail!(
            "Validation failed with {} error(s) and {} warning(s)",
            errors + usize::from(tree_error),
            warnings
        );
    }
    if warnings > 0 && args.strict {
        anyhow::bail!(
            "Validation failed in strict mode with {} warning(s)",
            warnings
        );
    }
    if warnings > 0 {
        println!(
            "{} Manifest is valid with {} warning(s)",
            marker(&out, "⚠️ ", "[WARN]"),
            warnings
        );
    } else {
        println!("{} Manifest is valid", marker(&out, "✅", "[OK]"));
    }
    Ok(())
}
