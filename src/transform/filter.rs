//! Metadata-driven field filtering
//!
//! Drops fields the operator did not select or the connector declared
//! unsupported, before type coercion runs.

use crate::metadata::{Inclusion, Metadata};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Prunes object fields according to compiled stream metadata
#[derive(Debug, Clone, Copy)]
pub struct FieldFilter<'m> {
    metadata: &'m Metadata,
}

impl<'m> FieldFilter<'m> {
    /// Create a filter over the given metadata
    pub fn new(metadata: &'m Metadata) -> Self {
        Self { metadata }
    }

    /// Filter `data`, recording the dotted path of every dropped field in
    /// `filtered`.
    ///
    /// Only object-shaped data is touched, and only when the metadata is
    /// non-empty. Fields with `inclusion: automatic` are kept as-is.
    pub fn filter(&self, data: Value, filtered: &mut BTreeSet<String>) -> Value {
        if self.metadata.is_empty() {
            return data;
        }
        let mut parent = Vec::new();
        self.filter_recur(data, &mut parent, filtered)
    }

    fn filter_recur(
        &self,
        data: Value,
        parent: &mut Vec<String>,
        filtered: &mut BTreeSet<String>,
    ) -> Value {
        match data {
            Value::Object(map) => {
                let mut result = Map::with_capacity(map.len());
                for (field, value) in map {
                    parent.push("properties".to_string());
                    parent.push(field.clone());

                    let inclusion = self.metadata.inclusion(parent);
                    if inclusion == Some(Inclusion::Automatic) {
                        result.insert(field, value);
                    } else if self.metadata.selected(parent) == Some(false)
                        || inclusion == Some(Inclusion::Unsupported)
                    {
                        filtered.insert(breadcrumb_path(parent));
                    } else {
                        let value = self.filter_recur(value, parent, filtered);
                        result.insert(field, value);
                    }

                    parent.truncate(parent.len() - 2);
                }
                Value::Object(result)
            }
            Value::Array(items) => {
                parent.push("items".to_string());
                let result = items
                    .into_iter()
                    .map(|item| self.filter_recur(item, parent, filtered))
                    .collect();
                parent.pop();
                Value::Array(result)
            }
            other => other,
        }
    }
}

/// Render a schema breadcrumb in dot notation (`properties.a.items.properties.b`
/// becomes `a[].b`)
pub fn breadcrumb_path<S: AsRef<str>>(breadcrumb: &[S]) -> String {
    let joined = breadcrumb
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".");
    joined.replace("properties.", "").replace(".items", "[]")
}
