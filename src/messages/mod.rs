//! Tap message protocol
//!
//! Taps talk to targets with newline-delimited JSON on stdout.
//!
//! # Features
//!
//! - `RECORD`, `SCHEMA`, `STATE` and `ACTIVATE_VERSION` messages
//! - Parsing that tolerates unknown message types
//! - ASCII-safe serialization
//! - A flushing line writer over any `io::Write`

mod types;
mod writer;

pub use types::{parse_message, Message};
pub use writer::{
    format_message, write_message, write_record, write_records, write_schema, write_state,
    write_version, MessageWriter,
};
