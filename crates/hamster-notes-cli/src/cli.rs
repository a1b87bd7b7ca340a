use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface: the two timer commands plus config and health plumbing.
#[derive(Parser, Debug)]
#[command(
    name = "hamster-notes",
    about = "Start and stop Hamster timers from markdown task lines",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a Hamster fact from the task on a line of a note.
    Start {
        /// Markdown note to read.
        file: PathBuf,
        /// 1-based line number of the task.
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        line: u32,
        /// Print the fact that would be sent without contacting Hamster.
        #[arg(long)]
        dry_run: bool,
    },
    /// Stop the running Hamster fact.
    Stop,
    /// Check whether the Hamster daemon is reachable.
    Health,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
    /// Print the resolved configuration.
    Show,
    /// Store a new value for the plugin setting.
    Set {
        value: String,
    },
}
