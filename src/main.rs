//! # Resource Merge CLI
//!
//! This is the binary entry point for the `resource-merge` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Handling top-level application errors and translating them into user-friendly
//!   output.
//!
//! The repository tree, merging and caching live in the `lib.rs` library crate;
//! the binary only loads manifests into it and prints what it sees.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
