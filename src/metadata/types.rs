//! Metadata types

use crate::error::Error;
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Whether a field may ever be synced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    /// Always synced, regardless of selection
    Automatic,
    /// Synced when selected
    Available,
    /// Never synced
    Unsupported,
}

impl Inclusion {
    /// The wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Inclusion::Automatic => "automatic",
            Inclusion::Available => "available",
            Inclusion::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Inclusion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(Inclusion::Automatic),
            "available" => Ok(Inclusion::Available),
            "unsupported" => Ok(Inclusion::Unsupported),
            other => Err(Error::invalid_value(
                "inclusion",
                format!("Unknown inclusion '{other}'"),
            )),
        }
    }
}

/// One `{breadcrumb, metadata}` pair as it appears in a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Schema path, e.g. `["properties", "id"]`; empty for the stream itself
    pub breadcrumb: Vec<String>,

    /// Flags at that path
    #[serde(default)]
    pub metadata: JsonObject,
}

impl MetadataEntry {
    /// Create an entry
    pub fn new(breadcrumb: Vec<String>, metadata: JsonObject) -> Self {
        Self {
            breadcrumb,
            metadata,
        }
    }
}

/// Compiled, breadcrumb-keyed metadata for one stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: BTreeMap<Vec<String>, JsonObject>,
}

impl Metadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a flat entry list; entries repeating a breadcrumb are merged
    /// key by key, later keys winning
    pub fn from_list(entries: &[MetadataEntry]) -> Self {
        let mut compiled = Self::new();
        for entry in entries {
            compiled
                .entries
                .entry(entry.breadcrumb.clone())
                .or_default()
                .extend(entry.metadata.clone());
        }
        compiled
    }

    /// Flatten back into an entry list, root breadcrumb first
    pub fn to_list(&self) -> Vec<MetadataEntry> {
        self.entries
            .iter()
            .map(|(breadcrumb, metadata)| MetadataEntry::new(breadcrumb.clone(), metadata.clone()))
            .collect()
    }

    /// Whether no breadcrumb carries any metadata
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of breadcrumbs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(breadcrumb, flags)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<String>, &JsonObject)> {
        self.entries.iter()
    }

    /// All flags at a breadcrumb
    pub fn flags(&self, breadcrumb: &[String]) -> Option<&JsonObject> {
        self.entries.get(breadcrumb)
    }

    /// One flag at a breadcrumb
    pub fn get<S: AsRef<str>>(&self, breadcrumb: &[S], key: &str) -> Option<&JsonValue> {
        self.flags(&owned(breadcrumb))?.get(key)
    }

    /// Set one flag at a breadcrumb, creating the breadcrumb if needed
    pub fn write<S: AsRef<str>>(&mut self, breadcrumb: &[S], key: &str, value: impl Into<JsonValue>) {
        self.entries
            .entry(owned(breadcrumb))
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// The `selected` flag, when it is a boolean
    pub fn selected(&self, breadcrumb: &[String]) -> Option<bool> {
        self.flags(breadcrumb)?.get("selected")?.as_bool()
    }

    /// The `inclusion` flag, when it names a known inclusion
    pub fn inclusion(&self, breadcrumb: &[String]) -> Option<Inclusion> {
        self.flags(breadcrumb)?
            .get("inclusion")?
            .as_str()?
            .parse()
            .ok()
    }
}

impl FromIterator<MetadataEntry> for Metadata {
    fn from_iter<I: IntoIterator<Item = MetadataEntry>>(iter: I) -> Self {
        let entries: Vec<MetadataEntry> = iter.into_iter().collect();
        Self::from_list(&entries)
    }
}

fn owned<S: AsRef<str>>(breadcrumb: &[S]) -> Vec<String> {
    breadcrumb.iter().map(|s| s.as_ref().to_string()).collect()
}
