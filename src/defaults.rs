//! Default values for resource-merge commands.
//!
//! Centralized so every command resolves the manifest the same way.

/// File name looked up in the working directory when no manifest is given.
pub const DEFAULT_MANIFEST: &str = "resources.yaml";

/// Environment variable overriding the manifest path.
pub const MANIFEST_ENV: &str = "RESOURCE_MERGE_MANIFEST";

/// Display name of the composite a manifest is loaded into.
pub const ROOT_NAME: &str = "root";
