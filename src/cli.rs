//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;

/// Resource Merge - Inspect the merged view of layered resource repositories
#[derive(Parser, Debug)]
#[command(name = "resource-merge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the visible resources of the merged view
    Ls(commands::ls::LsArgs),

    /// Display the repository tree described by a manifest
    Tree(commands::tree::TreeArgs),

    /// Show namespaces, leaf priority and modification count
    Info(commands::info::InfoArgs),

    /// Validate a manifest
    Validate(commands::validate::ValidateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level)?;

        match self.command {
            Commands::Ls(args) => commands::ls::execute(args, &self.color),
            Commands::Tree(args) => commands::tree::execute(args),
            Commands::Info(args) => commands::info::execute(args, &self.color),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Sets up `env_logger`. `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) -> Result<()> {
    let filter: LevelFilter = level
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid log level '{}'", level))?;
    let mut builder = env_logger::Builder::new();
    builder.filter_level(filter).parse_default_env();
    // A second initialization (e.g. from tests) keeps the first logger.
    let _ = builder.try_init();
    Ok(())
}
