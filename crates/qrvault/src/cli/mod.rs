//! Command-line interface for qrvault.
//!
//! This module provides the CLI structure for the `qrvault` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    ConfigCommand, HistoryCommand, OutputFormat, PurgeCommand, ServeCommand, StatusCommand,
};

/// qrvault - Keep a history of generated QR codes per anonymous client
///
/// Serves a small JSON API that saves, lists and deletes QR payloads keyed
/// by a client-generated identifier, and offers maintenance commands over
/// the same database.
#[derive(Debug, Parser)]
#[command(name = "qrvault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP API server
    Serve(ServeCommand),

    /// Show database status
    Status(StatusCommand),

    /// List a client's saved records
    History(HistoryCommand),

    /// Remove a client and all of its records
    Purge(PurgeCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
