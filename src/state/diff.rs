//! State diffing

use crate::types::{DataPath, JsonValue, PathSegment};
use serde::Serialize;
use std::collections::BTreeMap;

/// One difference between two states
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum StateChange {
    /// Leaf only present in the new state
    Add { path: DataPath, new_value: JsonValue },
    /// Leaf only present in the old state
    Remove { path: DataPath, old_value: JsonValue },
    /// Leaf present in both with different values
    Change {
        path: DataPath,
        old_value: JsonValue,
        new_value: JsonValue,
    },
}

impl StateChange {
    /// Location of the difference
    pub fn path(&self) -> &DataPath {
        match self {
            StateChange::Add { path, .. }
            | StateChange::Remove { path, .. }
            | StateChange::Change { path, .. } => path,
        }
    }
}

/// Flatten a value into `(path, leaf)` pairs, object keys in sorted order.
///
/// Empty objects and arrays contribute no pairs.
pub fn paths(value: &JsonValue) -> Vec<(DataPath, &JsonValue)> {
    let mut result = Vec::new();
    let mut base = DataPath::root();
    collect_paths(value, &mut base, &mut result);
    result
}

fn collect_paths<'v>(
    value: &'v JsonValue,
    base: &mut DataPath,
    result: &mut Vec<(DataPath, &'v JsonValue)>,
) {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                base.push(PathSegment::Key(key.clone()));
                collect_paths(&map[key.as_str()], base, result);
                base.pop();
            }
        }
        JsonValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                base.push(i);
                collect_paths(item, base, result);
                base.pop();
            }
        }
        leaf => result.push((base.clone(), leaf)),
    }
}

/// Compare two states leaf by leaf, sorted by path
pub fn diff(old: &JsonValue, new: &JsonValue) -> Vec<StateChange> {
    let old_leaves: BTreeMap<DataPath, &JsonValue> = paths(old).into_iter().collect();
    let new_leaves: BTreeMap<DataPath, &JsonValue> = paths(new).into_iter().collect();

    let mut changes = Vec::new();
    for (path, old_value) in &old_leaves {
        match new_leaves.get(path) {
            None => changes.push(StateChange::Remove {
                path: path.clone(),
                old_value: (*old_value).clone(),
            }),
            Some(new_value) if new_value != old_value => changes.push(StateChange::Change {
                path: path.clone(),
                old_value: (*old_value).clone(),
                new_value: (*new_value).clone(),
            }),
            Some(_) => {}
        }
    }
    for (path, new_value) in &new_leaves {
        if !old_leaves.contains_key(path) {
            changes.push(StateChange::Add {
                path: path.clone(),
                new_value: (*new_value).clone(),
            });
        }
    }

    changes.sort_by(|a, b| a.path().cmp(b.path()));
    changes
}
