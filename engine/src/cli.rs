//! CLI interface for Regent
//!
//! Command-line surface built with clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default experiment directory name under the templates directory
pub const DEFAULT_EXPERIMENT: &str = "internal_regulations";

/// Regent document exploration agent
///
/// Explores a corpus of internal documents for a change request and writes
/// a report of the revisions it proposes.
#[derive(Parser, Debug)]
#[command(name = "regent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Explore the corpus for a change request and write a report
    Run {
        /// The change request
        #[arg(short, long)]
        query: String,

        /// Reasoning backend as `provider` or `provider:model`
        #[arg(short, long, value_name = "SELECTOR")]
        model: Option<String>,

        /// Experiment directory under the templates directory
        #[arg(short, long, default_value = DEFAULT_EXPERIMENT)]
        experiment: String,

        /// Reuse the persisted corpus index instead of rescanning
        #[arg(long)]
        skip_index_regeneration: bool,
    },

    /// Regenerate and print the corpus index
    Index {
        /// Experiment directory under the templates directory
        #[arg(short, long, default_value = DEFAULT_EXPERIMENT)]
        experiment: String,
    },
}
