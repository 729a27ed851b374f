//! tapline CLI
//!
//! Command-line tools for line-delimited tap output

use clap::Parser;
use tapline::cli::{Cli, Runner};
use tapline::logger::init_logger_with_level;
use tapline::LogLevel;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logger_with_level(if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    let runner = Runner::new(cli);

    if let Err(e) = runner.run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
