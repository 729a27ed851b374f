//! CLI runner - executes commands

use crate::catalog::Catalog;
use crate::cli::commands::{Cli, Commands};
use crate::config::load_json;
use crate::error::{Error, Result};
use crate::messages::{parse_message, Message, MessageWriter};
use crate::metadata::Metadata;
use crate::metrics::{record_counter, Counter};
use crate::schema::generate_schema;
use crate::state::diff;
use crate::transform::{resolve_schema_references, IntegerDatetimeMode, RefStore, Transformer};
use crate::types::JsonValue;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::Path;

const MESSAGE_TYPES: &[&str] = &["RECORD", "SCHEMA", "STATE", "ACTIVATE_VERSION"];

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command on stdin and stdout
    pub fn run(&self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run the CLI command on the given input and output
    pub fn run_with<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<()> {
        match &self.cli.command {
            Commands::Transform {
                catalog,
                datetime_mode,
                no_ensure_ascii,
            } => {
                let mode: IntegerDatetimeMode = datetime_mode.parse()?;
                let writer = MessageWriter::new(output).with_ensure_ascii(!no_ensure_ascii);
                self.transform(catalog.as_deref(), mode, input, writer)
            }
            Commands::Infer { stream } => self.infer(stream.as_deref(), input, output),
            Commands::DiffState { old, new } => self.diff_state(old, new, output),
        }
    }

    /// Re-emit the message stream with every record coerced to its schema
    fn transform<R: BufRead, W: Write>(
        &self,
        catalog: Option<&Path>,
        mode: IntegerDatetimeMode,
        input: R,
        mut writer: MessageWriter<W>,
    ) -> Result<()> {
        let metadata: HashMap<String, Metadata> = match catalog {
            Some(path) => Catalog::load(path)?
                .streams
                .iter()
                .map(|entry| (entry.id().to_string(), entry.compiled_metadata()))
                .collect(),
            None => HashMap::new(),
        };

        let refs = RefStore::new();
        let mut schemas: HashMap<String, JsonValue> = HashMap::new();
        let mut counters: HashMap<String, Counter> = HashMap::new();
        let mut transformer = Transformer::new().with_integer_datetime_fmt(mode);

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Some(message) = parse_message(&line)? else {
                continue;
            };

            match message {
                Message::Schema {
                    ref stream,
                    ref schema,
                    ..
                } => {
                    let resolved = resolve_schema_references(schema.clone(), &refs)?;
                    if self.cli.verbose {
                        tracing::info!("Cached schema for stream {stream}");
                    }
                    schemas.insert(stream.clone(), resolved);
                    writer.write_message(&message)?;
                }
                Message::Record {
                    stream,
                    record,
                    version,
                    time_extracted,
                } => {
                    let schema = schemas.get(&stream).ok_or_else(|| Error::StreamNotFound {
                        stream: stream.clone(),
                    })?;
                    let record = match transformer.transform(record, schema, metadata.get(&stream)) {
                        Ok(record) => record,
                        Err(e) => {
                            for line in e.to_string().lines() {
                                tracing::error!("{line}");
                            }
                            return Err(e);
                        }
                    };
                    counters
                        .entry(stream.clone())
                        .or_insert_with(|| record_counter(Some(stream.as_str())))
                        .increment(1);
                    writer.write_message(&Message::Record {
                        stream,
                        record,
                        version,
                        time_extracted,
                    })?;
                }
                other => writer.write_message(&other)?,
            }
        }

        tracing::debug!("Wrote {} messages", writer.messages_written());
        Ok(())
    }

    /// Print a schema generated from the records on `input`
    fn infer<R: BufRead, W: Write>(
        &self,
        stream: Option<&str>,
        input: R,
        mut output: W,
    ) -> Result<()> {
        let mut records = Vec::new();

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value: JsonValue = serde_json::from_str(&line)?;
            let is_message = value
                .get("type")
                .and_then(JsonValue::as_str)
                .is_some_and(|t| MESSAGE_TYPES.contains(&t));

            if !is_message {
                records.push(value);
                continue;
            }
            if let Some(Message::Record {
                stream: record_stream,
                record,
                ..
            }) = parse_message(&line)?
            {
                if stream.map_or(true, |s| s == record_stream) {
                    records.push(record);
                }
            }
        }

        tracing::info!("Generating schema from {} records", records.len());
        let schema = generate_schema(&records);
        writeln!(output, "{}", serde_json::to_string_pretty(&schema)?)?;
        Ok(())
    }

    /// Print one JSON line per difference between two state files
    fn diff_state<W: Write>(&self, old: &Path, new: &Path, mut output: W) -> Result<()> {
        let old = load_json(old)?;
        let new = load_json(new)?;

        for change in diff(&old, &new) {
            writeln!(output, "{}", serde_json::to_string(&change)?)?;
        }
        output.flush()?;
        Ok(())
    }
}
