//! Shared test utilities for integration and E2E tests.
//!
//! This module provides manifest snippets, a temporary-directory fixture for
//! CLI tests and builders for in-memory repository trees.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_manifest(manifests::LAYERED);
//!     fixture.command().arg("ls").assert().success();
//! }
//! ```

#![allow(dead_code)]

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use resource_merge::memory::MemoryResourceRepository;
use resource_merge::repository::ItemMapLock;
use resource_merge::resource::{FolderConfiguration, ResourceNamespace, ResourceType};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Manifest snippets shared by the CLI tests.
pub mod manifests {
    /// Two leaves overriding each other, a library and a bundle.
    pub const LAYERED: &str = r##"
- leaf:
    name: main
    resources:
      - { type: string, name: app_name, value: "Main" }
      - { type: string, name: app_name, config: fr, value: "Principal" }
- composite:
    name: feature
    namespace: res-auto
    children:
      - leaf:
          name: feature_main
          resources:
            - { type: string, name: app_name, value: "Feature" }
            - { type: string, name: feature_title, value: "Feature title" }
            - { type: color, name: accent, value: "#ff0000" }
- library:
    name: appcompat
    namespace: androidx
    resources:
      - { type: string, name: ok, value: "OK" }
- bundle:
    name: sdk
    libraries:
      - name: framework
        namespace: android
        resources:
          - { type: string, name: cancel, value: "Cancel" }
"##;

    /// A single leaf with one resource.
    pub const MINIMAL: &str = r#"
- leaf:
    name: main
    resources:
      - { type: string, name: hello, value: "Hello" }
"#;

    /// Parses but has an empty leaf, which is a warning.
    pub const WITH_WARNING: &str = r#"
- leaf:
    name: main
    resources:
      - { type: string, name: hello, value: "Hello" }
- leaf:
    name: placeholder
"#;

    /// Misspelled node kind.
    pub const TYPO: &str = r#"
- leef:
    name: main
"#;

    /// A library of another namespace inside a single-namespace composite.
    pub const FOREIGN_NAMESPACE: &str = r#"
- composite:
    name: module
    namespace: res-auto
    children:
      - library:
          name: appcompat
          namespace: androidx
          resources:
            - { type: string, name: ok, value: "OK" }
"#;

    /// Invalid YAML syntax.
    pub const INVALID_YAML: &str = "- leaf: [unclosed";
}

/// A temporary directory that optionally holds a `resources.yaml` manifest.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `resources.yaml` with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.temp_dir
            .child("resources.yaml")
            .write_str(content)
            .expect("Failed to write manifest");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.temp_dir.path().join("resources.yaml")
    }

    /// A command for the binary running inside the fixture, with colors
    /// disabled and no manifest override from the environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("resource-merge");
        cmd.current_dir(self.path())
            .env_remove("RESOURCE_MERGE_MANIFEST")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A leaf of the default namespace holding strings `name -> value` for the
/// default configuration.
pub fn string_leaf(
    name: &str,
    lock: &ItemMapLock,
    strings: &[(&str, &str)],
) -> Arc<MemoryResourceRepository> {
    let leaf = MemoryResourceRepository::with_lock(name, ResourceNamespace::res_auto(), lock);
    leaf.add_items(strings.iter().map(|(key, value)| {
        leaf.new_item(ResourceType::String, *key, FolderConfiguration::default())
            .with_value(*value)
    }));
    leaf
}

/// `config` parsed from its qualifier string.
pub fn config(qualifier: &str) -> FolderConfiguration {
    qualifier.parse().expect("valid folder configuration")
}
