//! # Error Suggestions
//!
//! Helper functions for generating error messages with hints. Errors should
//! tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resource_merge::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Manifest not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::manifest_not_found(path));
//! ```

use std::path::Path;

use crate::resource::{ResourceNamespace, ResourceType};

/// Generate an error for when the manifest file is not found.
///
/// Includes hints about:
/// - Creating a manifest
/// - Using the -m/--manifest flag
/// - Using the RESOURCE_MERGE_MANIFEST environment variable
pub fn manifest_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Manifest file not found: {path}\n\n\
         hint: Create a resources.yaml file describing the repository tree\n\
         hint: Use -m/--manifest to specify a different path\n\
         hint: Set RESOURCE_MERGE_MANIFEST environment variable",
        path = path.display()
    )
}

/// Generate an error for an invalid glob pattern.
pub fn invalid_glob(pattern: &str, error: &glob::PatternError) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid glob pattern: {pattern}\n\
         error: {error}\n\n\
         hint: Use * to match any run of characters, ? for a single one\n\
         hint: Use [abc] for character classes, [!abc] to negate"
    )
}

/// Generate an error for a resource type name that does not exist.
pub fn unknown_resource_type(input: &str) -> anyhow::Error {
    let names: Vec<&str> = ResourceType::ALL.iter().map(|ty| ty.name()).collect();
    let did_you_mean = find_similar(input, &names)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown resource type: {input}{did_you_mean}\n\n\
         Valid types are: {types}",
        types = names.join(", ")
    )
}

/// Generate an error for a namespace that no repository of the tree provides.
pub fn unknown_namespace(namespace: &str, available: &[ResourceNamespace]) -> anyhow::Error {
    let names: Vec<&str> = available.iter().map(ResourceNamespace::as_str).collect();
    let did_you_mean = find_similar(namespace, &names)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "No repository provides namespace '{namespace}'{did_you_mean}\n\n\
         hint: Run 'resource-merge info' to list the namespaces of the tree"
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
pub fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // Single rolling row of the distance matrix.
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}
