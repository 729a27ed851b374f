//! Schema types

use crate::error::Result;
use crate::metadata::Inclusion;
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    /// Look up a type by its JSON Schema name
    pub fn from_name(name: &str) -> Option<JsonType> {
        match name {
            "string" => Some(JsonType::String),
            "number" => Some(JsonType::Number),
            "integer" => Some(JsonType::Integer),
            "boolean" => Some(JsonType::Boolean),
            "object" => Some(JsonType::Object),
            "array" => Some(JsonType::Array),
            "null" => Some(JsonType::Null),
            _ => None,
        }
    }

    /// The JSON Schema name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Null => "null",
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON type can be a single type or array of types (for nullable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    /// Create a single type
    pub fn single(t: JsonType) -> Self {
        JsonTypeOrArray::Single(t)
    }

    /// Create a nullable type, `null` listed first
    pub fn nullable(t: JsonType) -> Self {
        if t == JsonType::Null {
            JsonTypeOrArray::Single(JsonType::Null)
        } else {
            JsonTypeOrArray::Multiple(vec![JsonType::Null, t])
        }
    }

    /// Check if this type is nullable
    pub fn is_nullable(&self) -> bool {
        self.contains(JsonType::Null)
    }

    /// Check whether `t` is one of the candidate types
    pub fn contains(&self, t: JsonType) -> bool {
        match self {
            JsonTypeOrArray::Single(single) => *single == t,
            JsonTypeOrArray::Multiple(types) => types.contains(&t),
        }
    }

    /// Get the primary (non-null) type
    pub fn primary_type(&self) -> Option<JsonType> {
        match self {
            JsonTypeOrArray::Single(JsonType::Null) => None,
            JsonTypeOrArray::Single(t) => Some(*t),
            JsonTypeOrArray::Multiple(types) => types.iter().copied().find(|t| *t != JsonType::Null),
        }
    }
}

/// Object model for a JSON Schema node, as carried in catalogs
///
/// Only the keywords connectors routinely inspect are modelled; any other key
/// is dropped by [`Schema::from_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub json_type: Option<JsonTypeOrArray>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    /// Legacy stream/field selection flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Inclusion>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    /// A number (draft 6+) or a boolean (draft 4)
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<JsonValue>,

    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<JsonValue>,

    #[serde(rename = "multipleOf", skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,

    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    /// A boolean or a schema
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<JsonValue>,

    #[serde(rename = "anyOf", skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<JsonValue>>,

    #[serde(rename = "patternProperties", skip_serializing_if = "Option::is_none")]
    pub pattern_properties: Option<JsonObject>,
}

impl Schema {
    /// Create an empty (untyped) schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema of the given type
    pub fn of(json_type: JsonType) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::single(json_type)),
            ..Self::default()
        }
    }

    /// Create a nullable schema of the given type
    pub fn nullable(json_type: JsonType) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::nullable(json_type)),
            ..Self::default()
        }
    }

    /// Create an object schema with nested properties
    pub fn object(properties: BTreeMap<String, Schema>) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::single(JsonType::Object)),
            properties: Some(properties),
            ..Self::default()
        }
    }

    /// Create an array schema with an item schema
    pub fn array(items: Schema) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::single(JsonType::Array)),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// Set format hint
    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Set description
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Set the selection flag
    #[must_use]
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = Some(selected);
        self
    }

    /// Set the inclusion
    #[must_use]
    pub fn with_inclusion(mut self, inclusion: Inclusion) -> Self {
        self.inclusion = Some(inclusion);
        self
    }

    /// Check if nullable
    pub fn is_nullable(&self) -> bool {
        self.json_type
            .as_ref()
            .is_some_and(JsonTypeOrArray::is_nullable)
    }

    /// Get a property
    pub fn get_property(&self, name: &str) -> Option<&Schema> {
        self.properties.as_ref()?.get(name)
    }

    /// Build from a raw JSON Schema mapping
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        Ok(Schema::deserialize(value)?)
    }

    /// Render as a raw JSON Schema mapping
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
