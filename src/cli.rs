//! CLI definitions for Skillstar.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use skillstar_queue::SuggestAction;

/// Skillstar CLI.
#[derive(Parser)]
#[command(name = "skillstar")]
#[command(about = "Suggest practice skills to classes and students on a learning platform")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/skillstar.toml", global = true, env = "SKILLSTAR_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Submit one assignment batch and follow it to completion
    Assign(AssignArgs),

    /// Load and validate the configuration
    CheckConfig,
}

#[derive(Args)]
pub(crate) struct AssignArgs {
    /// Catalog JSON file with students, skills and groups
    #[arg(long)]
    pub catalog: PathBuf,

    /// Skill ids, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub skills: Vec<String>,

    /// Student ids, comma separated
    #[arg(long, value_delimiter = ',')]
    pub students: Vec<String>,

    /// Group names, comma separated
    #[arg(long, value_delimiter = ',')]
    pub groups: Vec<String>,

    /// suggest or unsuggest
    #[arg(long, default_value = "suggest")]
    pub action: SuggestAction,

    /// Status polling interval in milliseconds
    #[arg(long, default_value_t = 500)]
    pub poll_ms: u64,

    /// Print the finished task as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
