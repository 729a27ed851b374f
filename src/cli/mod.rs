//! CLI module
//!
//! The standard tap arguments, plus the `tapline` binary's commands.
//!
//! # Commands
//!
//! - `transform` - Coerce records on stdin to their stream's schema
//! - `infer` - Generate a schema from sample records
//! - `diff-state` - Compare two state files

mod args;
mod commands;
mod runner;

pub use args::{parse_args, ParsedArgs, TapArgs};
pub use commands::{Cli, Commands};
pub use runner::Runner;
