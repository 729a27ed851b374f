//! Stream metadata
//!
//! Catalogs carry per-field flags as a flat list of `{breadcrumb, metadata}`
//! pairs. [`Metadata`] compiles that list into a breadcrumb-keyed map for
//! lookups during selection and transformation.

mod types;

pub use types::{Inclusion, Metadata, MetadataEntry};

use crate::schema::Schema;

/// Compile a flat entry list into breadcrumb-keyed metadata
pub fn to_map(entries: &[MetadataEntry]) -> Metadata {
    Metadata::from_list(entries)
}

/// Flatten compiled metadata into an entry list
pub fn to_list(metadata: &Metadata) -> Vec<MetadataEntry> {
    metadata.to_list()
}

/// Decide whether a field is synced.
///
/// `automatic` fields always are and `unsupported` fields never are; any
/// other field follows `selected`, falling back to `default` when unset.
pub fn should_sync_field(inclusion: Option<Inclusion>, selected: Option<bool>, default: bool) -> bool {
    match inclusion {
        Some(Inclusion::Automatic) => true,
        Some(Inclusion::Unsupported) => false,
        _ => selected.unwrap_or(default),
    }
}

/// Build the metadata a tap typically advertises for a discovered stream.
///
/// Key properties are marked `automatic`; every other top-level property is
/// `available`.
pub fn get_standard_metadata(
    schema: Option<&Schema>,
    schema_name: Option<&str>,
    key_properties: Option<&[String]>,
    valid_replication_keys: Option<&[String]>,
    replication_method: Option<&str>,
) -> Vec<MetadataEntry> {
    let root: [&str; 0] = [];
    let mut md = Metadata::new();

    if let Some(keys) = key_properties {
        md.write(&root, "table-key-properties", keys.to_vec());
    }
    if let Some(method) = replication_method.filter(|m| !m.is_empty()) {
        md.write(&root, "forced-replication-method", method);
    }
    if let Some(keys) = valid_replication_keys {
        md.write(&root, "valid-replication-keys", keys.to_vec());
    }

    if let Some(schema) = schema {
        md.write(&root, "inclusion", Inclusion::Available.as_str());
        if let Some(name) = schema_name {
            md.write(&root, "schema-name", name);
        }
        for field in schema.properties.iter().flat_map(|p| p.keys()) {
            let is_key = key_properties.is_some_and(|keys| keys.contains(field));
            let inclusion = if is_key {
                Inclusion::Automatic
            } else {
                Inclusion::Available
            };
            md.write(&["properties", field.as_str()], "inclusion", inclusion.as_str());
        }
    }

    md.to_list()
}
