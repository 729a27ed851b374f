//! Message types
//!
//! The four messages exchanged between taps and targets.

use crate::error::{Error, Result};
use crate::transform::strftime;
use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::json;

/// A message written by a tap, one per line
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// One record of a stream
    Record {
        /// Stream the record belongs to
        stream: String,
        /// The record data
        record: JsonValue,
        /// Version of a versioned stream
        version: Option<i64>,
        /// When the record was read from the source
        time_extracted: Option<DateTime<Utc>>,
    },
    /// The schema of a stream's records
    Schema {
        /// Stream the schema describes
        stream: String,
        /// The JSON schema
        schema: JsonValue,
        /// Primary key properties
        key_properties: Vec<String>,
        /// Properties used as bookmarks
        bookmark_properties: Option<Vec<String>>,
    },
    /// A checkpoint of tap state
    State {
        /// The state value
        value: JsonValue,
    },
    /// Tells the target to replace a stream's data with the given version
    ActivateVersion {
        /// Stream name
        stream: String,
        /// Version to activate
        version: i64,
    },
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, record: JsonValue) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            version: None,
            time_extracted: None,
        }
    }

    /// Create a schema message
    pub fn schema(stream: impl Into<String>, schema: JsonValue, key_properties: Vec<String>) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties,
            bookmark_properties: None,
        }
    }

    /// Create a state message
    pub fn state(value: JsonValue) -> Self {
        Self::State { value }
    }

    /// Create an activate-version message
    pub fn activate_version(stream: impl Into<String>, version: i64) -> Self {
        Self::ActivateVersion {
            stream: stream.into(),
            version,
        }
    }

    /// The `type` tag on the wire
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Record { .. } => "RECORD",
            Self::Schema { .. } => "SCHEMA",
            Self::State { .. } => "STATE",
            Self::ActivateVersion { .. } => "ACTIVATE_VERSION",
        }
    }

    /// The stream this message belongs to, if any
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Record { stream, .. }
            | Self::Schema { stream, .. }
            | Self::ActivateVersion { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Render the wire shape
    pub fn to_value(&self) -> JsonValue {
        match self {
            Self::Record {
                stream,
                record,
                version,
                time_extracted,
            } => {
                let mut out = JsonObject::new();
                out.insert("type".into(), self.message_type().into());
                out.insert("stream".into(), stream.as_str().into());
                out.insert("record".into(), record.clone());
                if let Some(version) = version {
                    out.insert("version".into(), (*version).into());
                }
                if let Some(time_extracted) = time_extracted {
                    out.insert("time_extracted".into(), strftime(time_extracted).into());
                }
                JsonValue::Object(out)
            }
            Self::Schema {
                stream,
                schema,
                key_properties,
                bookmark_properties,
            } => {
                let mut out = JsonObject::new();
                out.insert("type".into(), self.message_type().into());
                out.insert("stream".into(), stream.as_str().into());
                out.insert("schema".into(), schema.clone());
                out.insert("key_properties".into(), json!(key_properties));
                if let Some(bookmarks) = bookmark_properties.as_ref().filter(|b| !b.is_empty()) {
                    out.insert("bookmark_properties".into(), json!(bookmarks));
                }
                JsonValue::Object(out)
            }
            Self::State { value } => json!({"type": self.message_type(), "value": value}),
            Self::ActivateVersion { stream, version } => json!({
                "type": self.message_type(),
                "stream": stream,
                "version": version,
            }),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse one line into a message.
///
/// Returns `Ok(None)` for message types this crate does not know.
pub fn parse_message(line: &str) -> Result<Option<Message>> {
    let value: JsonValue = serde_json::from_str(line)?;
    let obj = value
        .as_object()
        .ok_or_else(|| Error::invalid_message(format!("expected a JSON object: {line}")))?;

    let message = match required_str(obj, "type", line)? {
        "RECORD" => Message::Record {
            stream: required_str(obj, "stream", line)?.to_string(),
            record: required_key(obj, "record", line)?.clone(),
            version: optional_version(obj)?,
            time_extracted: parse_time_extracted(obj.get("time_extracted"))?,
        },
        "SCHEMA" => Message::Schema {
            stream: required_str(obj, "stream", line)?.to_string(),
            schema: required_key(obj, "schema", line)?.clone(),
            key_properties: string_list(required_key(obj, "key_properties", line)?, "key_properties")?,
            bookmark_properties: match obj.get("bookmark_properties") {
                None | Some(JsonValue::Null) => None,
                Some(value) => Some(string_list(value, "bookmark_properties")?),
            },
        },
        "STATE" => Message::State {
            value: required_key(obj, "value", line)?.clone(),
        },
        "ACTIVATE_VERSION" => Message::ActivateVersion {
            stream: required_str(obj, "stream", line)?.to_string(),
            version: as_version(required_key(obj, "version", line)?)?,
        },
        other => {
            tracing::debug!("Ignoring message of unknown type {other}");
            return Ok(None);
        }
    };
    Ok(Some(message))
}

fn required_key<'a>(obj: &'a JsonObject, key: &str, line: &str) -> Result<&'a JsonValue> {
    obj.get(key).ok_or_else(|| Error::MissingMessageKey {
        key: key.to_string(),
        message: line.to_string(),
    })
}

fn required_str<'a>(obj: &'a JsonObject, key: &str, line: &str) -> Result<&'a str> {
    required_key(obj, key, line)?
        .as_str()
        .ok_or_else(|| Error::invalid_message(format!("'{key}' must be a string: {line}")))
}

fn optional_version(obj: &JsonObject) -> Result<Option<i64>> {
    match obj.get("version") {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => as_version(value).map(Some),
    }
}

fn as_version(value: &JsonValue) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| Error::invalid_message(format!("version must be an integer, got {value}")))
}

/// A single string or a list of strings
fn string_list(value: &JsonValue, key: &str) -> Result<Vec<String>> {
    let invalid = || Error::invalid_message(format!("{key} must be a string or list of strings"));
    match value {
        JsonValue::String(s) => Ok(vec![s.clone()]),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

/// Aware timestamps are accepted, naive ones are rejected and anything else
/// is dropped with a warning.
fn parse_time_extracted(value: Option<&JsonValue>) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = value.and_then(JsonValue::as_str).map(str::trim).filter(|s| !s.is_empty())
    else {
        return Ok(None);
    };

    let aware = std::iter::once(DateTime::parse_from_rfc3339(raw))
        .chain(AWARE_FORMATS.iter().map(|fmt| DateTime::parse_from_str(raw, fmt)))
        .find_map(std::result::Result::ok);
    if let Some(dt) = aware {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(raw, fmt).is_ok());
    if naive {
        return Err(Error::invalid_message(
            "'time_extracted' must be either None or an aware datetime (with a time zone)",
        ));
    }

    tracing::warn!("Unable to parse time_extracted {raw:?}");
    Ok(None)
}

const AWARE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
