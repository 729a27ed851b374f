//! Connector state and bookmark accessors
//!
//! State is an arbitrary JSON object that a tap emits in STATE messages and
//! receives back on its next run. By convention it holds per-stream
//! `bookmarks`, per-stream `activate_versions` and the `currently_syncing`
//! stream.

use crate::error::{Error, Result};
use crate::transform::strftime;
use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const BOOKMARKS: &str = "bookmarks";
const ACTIVATE_VERSIONS: &str = "activate_versions";
const CURRENTLY_SYNCING: &str = "currently_syncing";
const OFFSET: &str = "offset";

/// Complete state for a connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(JsonObject);

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            JsonValue::Null => Ok(Self::new()),
            other => Err(Error::state(format!("State must be a JSON object, got {other}"))),
        }
    }

    /// Render as a JSON value
    pub fn to_value(&self) -> JsonValue {
        JsonValue::Object(self.0.clone())
    }

    /// The underlying object
    pub fn as_object(&self) -> &JsonObject {
        &self.0
    }

    /// Consume into the underlying object
    pub fn into_inner(self) -> JsonObject {
        self.0
    }

    /// Walk `path`, replacing missing, null or non-object nodes with empty
    /// objects, and return the object at its end
    pub fn ensure_path<S: AsRef<str>>(&mut self, path: &[S]) -> &mut JsonObject {
        let mut node = &mut self.0;
        for key in path {
            node = object_slot(node, key.as_ref());
        }
        node
    }

    /// Set a bookmark value for a stream
    pub fn set_bookmark(&mut self, tap_stream_id: &str, key: &str, value: impl Into<JsonValue>) {
        self.ensure_path(&[BOOKMARKS, tap_stream_id])
            .insert(key.to_string(), value.into());
    }

    /// Remove one bookmark value for a stream
    pub fn clear_bookmark(&mut self, tap_stream_id: &str, key: &str) {
        self.ensure_path(&[BOOKMARKS, tap_stream_id]).remove(key);
    }

    /// Forget every bookmark (and activate version, when tracked) for a stream
    pub fn reset_stream(&mut self, tap_stream_id: &str) {
        self.ensure_path(&[BOOKMARKS, tap_stream_id]).clear();
        if self.0.contains_key(ACTIVATE_VERSIONS) {
            self.ensure_path(&[ACTIVATE_VERSIONS, tap_stream_id]).clear();
        }
    }

    /// Get a bookmark value for a stream
    pub fn get_bookmark(&self, tap_stream_id: &str, key: &str) -> Option<&JsonValue> {
        self.stream_entry(BOOKMARKS, tap_stream_id)?.get(key)
    }

    /// Record progress within a stream
    pub fn set_offset(&mut self, tap_stream_id: &str, offset_key: &str, value: impl Into<JsonValue>) {
        self.ensure_path(&[BOOKMARKS, tap_stream_id, OFFSET])
            .insert(offset_key.to_string(), value.into());
    }

    /// Remove a stream's offset entirely
    pub fn clear_offset(&mut self, tap_stream_id: &str) {
        self.clear_bookmark(tap_stream_id, OFFSET);
    }

    /// Get a stream's offset
    pub fn get_offset(&self, tap_stream_id: &str) -> Option<&JsonValue> {
        self.get_bookmark(tap_stream_id, OFFSET)
    }

    /// Set (or, with `None`, clear) the stream currently being synced
    pub fn set_currently_syncing(&mut self, tap_stream_id: Option<&str>) {
        let value = tap_stream_id.map_or(JsonValue::Null, JsonValue::from);
        self.0.insert(CURRENTLY_SYNCING.to_string(), value);
    }

    /// The stream currently being synced
    pub fn get_currently_syncing(&self) -> Option<&str> {
        self.0.get(CURRENTLY_SYNCING)?.as_str()
    }

    /// Set an activate-version value for a stream
    pub fn set_version(&mut self, tap_stream_id: &str, key: &str, value: impl Into<JsonValue>) {
        self.ensure_path(&[ACTIVATE_VERSIONS, tap_stream_id])
            .insert(key.to_string(), value.into());
    }

    /// Remove an activate-version value for a stream
    pub fn clear_version(&mut self, tap_stream_id: &str, key: &str) {
        self.ensure_path(&[ACTIVATE_VERSIONS, tap_stream_id]).remove(key);
    }

    /// Get an activate-version value for a stream
    pub fn get_version(&self, tap_stream_id: &str, key: &str) -> Option<&JsonValue> {
        self.stream_entry(ACTIVATE_VERSIONS, tap_stream_id)?.get(key)
    }

    /// Advance the top-level timestamp `entity` to `dtime` unless it already
    /// holds a later one
    pub fn update_state(&mut self, entity: &str, dtime: &DateTime<Utc>) {
        let formatted = strftime(dtime);
        let newer = match self.0.get(entity).and_then(JsonValue::as_str) {
            Some(current) => formatted.as_str() >= current,
            None => true,
        };
        if newer {
            self.0.insert(entity.to_string(), JsonValue::String(formatted));
        }
    }

    fn stream_entry(&self, section: &str, tap_stream_id: &str) -> Option<&JsonObject> {
        self.0.get(section)?.get(tap_stream_id)?.as_object()
    }
}

impl From<JsonObject> for State {
    fn from(map: JsonObject) -> Self {
        Self(map)
    }
}

fn object_slot<'a>(map: &'a mut JsonObject, key: &str) -> &'a mut JsonObject {
    let slot = map.entry(key.to_string()).or_insert(JsonValue::Null);
    if !slot.is_object() {
        *slot = JsonValue::Object(JsonObject::new());
    }
    match slot {
        JsonValue::Object(inner) => inner,
        _ => unreachable!("slot was just replaced with an object"),
    }
}
