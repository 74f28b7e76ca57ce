//! CLI module for batchgen - command-line interface and subcommands.
//!
//! Provides `run` to drive a batch from an items file and `validate` to check
//! one without generating anything.

pub mod commands;

pub use commands::Cli;
