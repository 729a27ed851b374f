//! Catalog types

use crate::config::load_json;
use crate::error::{Error, Result};
use crate::metadata::{Metadata, MetadataEntry};
use crate::schema::Schema;
use crate::state::State;
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// One stream in a catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique stream identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_stream_id: Option<String>,

    /// Stream name as emitted in messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,

    /// Name the target should use instead of `stream`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_properties: Option<Vec<String>>,

    #[serde(default)]
    pub schema: Schema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_view: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<MetadataEntry>>,
}

impl CatalogEntry {
    /// Create an entry for a stream
    pub fn new(tap_stream_id: impl Into<String>, schema: Schema) -> Self {
        let id = tap_stream_id.into();
        Self {
            stream: Some(id.clone()),
            tap_stream_id: Some(id),
            schema,
            ..Self::default()
        }
    }

    /// Set the key properties
    #[must_use]
    pub fn with_key_properties(mut self, keys: Vec<String>) -> Self {
        self.key_properties = Some(keys);
        self
    }

    /// Set the metadata entries
    #[must_use]
    pub fn with_metadata(mut self, metadata: Vec<MetadataEntry>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The stream identifier, or an empty string when absent
    pub fn id(&self) -> &str {
        self.tap_stream_id.as_deref().unwrap_or_default()
    }

    /// Whether the stream is selected, by its schema's `selected` flag or the
    /// root metadata's
    pub fn is_selected(&self) -> bool {
        if self.schema.selected == Some(true) {
            return true;
        }
        self.compiled_metadata().selected(&[]).unwrap_or(false)
    }

    /// Compile this stream's metadata entries
    pub fn compiled_metadata(&self) -> Metadata {
        self.metadata
            .as_deref()
            .map(Metadata::from_list)
            .unwrap_or_default()
    }
}

/// The set of streams a tap can sync
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Create a catalog from entries
    pub fn new(streams: Vec<CatalogEntry>) -> Self {
        Self { streams }
    }

    /// Load a catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_value(&load_json(path)?)
    }

    /// Build a catalog from its JSON form; `streams` is required
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        if value.get("streams").is_none() {
            return Err(Error::discovery("Catalog is missing 'streams'"));
        }
        Ok(Catalog::deserialize(value)?)
    }

    /// Render as JSON
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Find a stream by its identifier
    pub fn get_stream(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|s| s.tap_stream_id.as_deref() == Some(tap_stream_id))
    }

    /// Selected streams, starting from the one `state` was syncing when the
    /// previous run stopped
    pub fn get_selected_streams(&self, state: &State) -> Vec<&CatalogEntry> {
        let start = state
            .get_currently_syncing()
            .and_then(|current| {
                self.streams
                    .iter()
                    .position(|s| s.tap_stream_id.as_deref() == Some(current))
            })
            .unwrap_or(0);

        let (before, after) = self.streams.split_at(start);
        after
            .iter()
            .chain(before)
            .filter(|stream| {
                let selected = stream.is_selected();
                if !selected {
                    tracing::info!("Skipping stream: {}", stream.id());
                }
                selected
            })
            .collect()
    }

    /// Write the catalog as pretty JSON
    pub fn dump<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}
