//! Schema generation from sample records
//!
//! Every value seen in the samples adds an observation at its location; the
//! observation tree is then rendered as a schema where each observed kind is
//! a nullable branch.

use super::types::JsonType;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Build a JSON Schema that accepts every one of `records`
pub fn generate_schema(records: &[Value]) -> Value {
    let mut observations = Observations::default();
    for record in records {
        observations.observe(record);
    }
    observations.to_schema()
}

/// Kinds observed at one location
#[derive(Debug, Default)]
struct Observations {
    array: Option<Box<Observations>>,
    object: Option<BTreeMap<String, Observations>>,
    number: bool,
    integer: bool,
    boolean: bool,
    string: bool,
    null: bool,
}

impl Observations {
    fn is_empty(&self) -> bool {
        self.array.is_none()
            && self.object.is_none()
            && !(self.number || self.integer || self.boolean || self.string || self.null)
    }

    fn observe(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                for (key, child_value) in map {
                    let mut child = self
                        .object
                        .as_mut()
                        .and_then(|children| children.remove(key))
                        .unwrap_or_default();
                    child.observe(child_value);
                    if !child.is_empty() {
                        self.object
                            .get_or_insert_with(BTreeMap::new)
                            .insert(key.clone(), child);
                    }
                }
            }
            Value::Array(items) => {
                let mut child = self.array.take().map(|c| *c).unwrap_or_default();
                if items.is_empty() {
                    child.observe(&Value::Null);
                }
                for item in items {
                    child.observe(item);
                }
                if !child.is_empty() {
                    self.array = Some(Box::new(child));
                }
            }
            Value::String(s) => match classify_string(s) {
                JsonType::Integer => self.integer = true,
                JsonType::Number => self.number = true,
                _ => self.string = true,
            },
            Value::Bool(_) => self.boolean = true,
            Value::Number(n) if n.is_f64() => self.number = true,
            Value::Number(_) => self.integer = true,
            Value::Null => self.null = true,
        }
    }

    fn to_schema(&self) -> Value {
        let mut branches = Vec::new();

        if let Some(items) = &self.array {
            branches.push(json!({"type": ["null", "array"], "items": items.to_schema()}));
        }
        if let Some(children) = &self.object {
            let properties: Map<String, Value> = children
                .iter()
                .map(|(key, child)| (key.clone(), child.to_schema()))
                .collect();
            branches.push(json!({"type": ["null", "object"], "properties": properties}));
        }
        if self.number {
            branches.push(json!({"type": ["null", "string"], "format": "singer.decimal"}));
        }
        if self.integer {
            branches.push(json!({"type": ["null", "integer"]}));
        }
        if self.boolean {
            branches.push(json!({"type": ["null", "boolean"]}));
        }
        if self.string {
            branches.push(json!({"type": ["null", "string"]}));
        }
        if self.null {
            branches.push(json!({"type": ["null"]}));
        }

        match branches.len() {
            0 => json!({"type": ["null", "string"]}),
            1 => branches.remove(0),
            _ => json!({"anyOf": branches}),
        }
    }
}

/// Strings that read as numbers are observed as numbers
fn classify_string(s: &str) -> JsonType {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix(['+', '-'])
        .unwrap_or(trimmed);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        JsonType::Integer
    } else if trimmed.parse::<f64>().is_ok() {
        JsonType::Number
    } else {
        JsonType::String
    }
}
