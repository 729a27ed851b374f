//! Line writer
//!
//! Writes one message per line and flushes after each one, so a downstream
//! target sees every message as soon as it is produced.

use super::types::Message;
use crate::error::Result;
use crate::types::JsonValue;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::io::{self, Write};

/// Serialize a message as one JSON line (without the newline).
///
/// With `ensure_ascii` every non-ASCII character is escaped as `\uXXXX`,
/// using surrogate pairs outside the basic multilingual plane.
pub fn format_message(message: &Message, ensure_ascii: bool) -> Result<String> {
    let json = serde_json::to_string(&message.to_value())?;
    if !ensure_ascii || json.is_ascii() {
        return Ok(json);
    }

    // Raw non-ASCII can only occur inside string literals, where an escape
    // is equivalent.
    let mut escaped = String::with_capacity(json.len() + 16);
    for c in json.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(escaped, "\\u{unit:04x}");
            }
        }
    }
    Ok(escaped)
}

/// Writes messages to any [`Write`] sink
#[derive(Debug)]
pub struct MessageWriter<W: Write> {
    inner: W,
    ensure_ascii: bool,
    messages_written: usize,
}

impl MessageWriter<io::Stdout> {
    /// Writer on standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> MessageWriter<W> {
    /// Wrap a sink; ASCII escaping is on by default
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            ensure_ascii: true,
            messages_written: 0,
        }
    }

    /// Enable or disable ASCII escaping
    #[must_use]
    pub fn with_ensure_ascii(mut self, ensure_ascii: bool) -> Self {
        self.ensure_ascii = ensure_ascii;
        self
    }

    /// Number of messages written so far
    #[must_use]
    pub fn messages_written(&self) -> usize {
        self.messages_written
    }

    /// Unwrap the sink
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write one message and flush
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        let line = format_message(message, self.ensure_ascii)?;
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()?;
        self.messages_written += 1;
        Ok(())
    }

    /// Write a record, under `stream_alias` when given
    pub fn write_record(
        &mut self,
        stream_name: &str,
        record: JsonValue,
        stream_alias: Option<&str>,
        time_extracted: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.write_message(&Message::Record {
            stream: stream_alias.unwrap_or(stream_name).to_string(),
            record,
            version: None,
            time_extracted,
        })
    }

    /// Write a record message for each record
    pub fn write_records<I>(&mut self, stream_name: &str, records: I) -> Result<()>
    where
        I: IntoIterator<Item = JsonValue>,
    {
        for record in records {
            self.write_record(stream_name, record, None, None)?;
        }
        Ok(())
    }

    /// Write a schema, under `stream_alias` when given
    pub fn write_schema(
        &mut self,
        stream_name: &str,
        schema: JsonValue,
        key_properties: Vec<String>,
        bookmark_properties: Option<Vec<String>>,
        stream_alias: Option<&str>,
    ) -> Result<()> {
        self.write_message(&Message::Schema {
            stream: stream_alias.unwrap_or(stream_name).to_string(),
            schema,
            key_properties,
            bookmark_properties,
        })
    }

    /// Write a state checkpoint
    pub fn write_state(&mut self, value: JsonValue) -> Result<()> {
        self.write_message(&Message::state(value))
    }

    /// Write an activate-version message
    pub fn write_version(&mut self, stream_name: &str, version: i64) -> Result<()> {
        self.write_message(&Message::activate_version(stream_name, version))
    }
}

// ============================================================================
// Stdout helpers
// ============================================================================

/// Write one message to stdout
pub fn write_message(message: &Message) -> Result<()> {
    MessageWriter::stdout().write_message(message)
}

/// Write a record to stdout
pub fn write_record(
    stream_name: &str,
    record: JsonValue,
    stream_alias: Option<&str>,
    time_extracted: Option<DateTime<Utc>>,
) -> Result<()> {
    MessageWriter::stdout().write_record(stream_name, record, stream_alias, time_extracted)
}

/// Write records to stdout
pub fn write_records<I>(stream_name: &str, records: I) -> Result<()>
where
    I: IntoIterator<Item = JsonValue>,
{
    MessageWriter::stdout().write_records(stream_name, records)
}

/// Write a schema to stdout
pub fn write_schema(
    stream_name: &str,
    schema: JsonValue,
    key_properties: Vec<String>,
    bookmark_properties: Option<Vec<String>>,
    stream_alias: Option<&str>,
) -> Result<()> {
    MessageWriter::stdout().write_schema(
        stream_name,
        schema,
        key_properties,
        bookmark_properties,
        stream_alias,
    )
}

/// Write a state checkpoint to stdout
pub fn write_state(value: JsonValue) -> Result<()> {
    MessageWriter::stdout().write_state(value)
}

/// Write an activate-version message to stdout
pub fn write_version(stream_name: &str, version: i64) -> Result<()> {
    MessageWriter::stdout().write_version(stream_name, version)
}
