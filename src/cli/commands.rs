//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tap protocol toolkit
#[derive(Parser, Debug)]
#[command(name = "tapline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Coerce RECORD messages on stdin to their stream's SCHEMA
    Transform {
        /// Catalog whose metadata selects fields (JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// How numbers in date-time fields are read
        #[arg(long, default_value = "no-integer-datetime-parsing")]
        datetime_mode: String,

        /// Write non-ASCII characters unescaped
        #[arg(long)]
        no_ensure_ascii: bool,
    },

    /// Generate a schema from records on stdin
    Infer {
        /// Only use RECORD messages of this stream
        #[arg(long)]
        stream: Option<String>,
    },

    /// Print the differences between two state files
    DiffState {
        /// Previous state (JSON)
        old: PathBuf,

        /// Current state (JSON)
        new: PathBuf,
    },
}
