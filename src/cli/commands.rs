//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: generate every item in an items file
//! - validate: check an items file without running it

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Batchgen - bounded-concurrency batch generation
#[derive(Parser, Debug)]
#[command(name = "batchgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate every item in a YAML items file
    Run {
        /// Items file: a list of {id?, type, input}
        items: PathBuf,

        /// Maximum simultaneous generation calls
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Minimum gap between successive launches, in milliseconds
        #[arg(short, long)]
        delay_ms: Option<u64>,

        /// Manual retries allowed per item
        #[arg(short = 'r', long)]
        max_retries: Option<u32>,

        /// Generator command (overrides generator.command)
        #[arg(long)]
        command: Option<String>,

        /// Keep retrying failed items until none are retryable
        #[arg(long)]
        retry_failed: bool,

        /// Print the final items as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Check an items file (types present, ids unique)
    Validate {
        /// Items file to check
        items: PathBuf,
    },
}
