//! `$ref` resolution
//!
//! Inlines every `$ref` reachable through `properties`, `patternProperties`,
//! `items` and `anyOf`, so the transformer never sees a reference.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;

const REF: &str = "$ref";

/// Referenced schema documents, keyed by document name (e.g. `"common.json"`)
pub type RefStore = HashMap<String, Value>;

/// Resolve and inline every `$ref` in `schema`.
///
/// Internal references (`#/definitions/x`) resolve against `schema` itself;
/// external ones (`doc.json#/definitions/x`, or `doc.json` for the whole
/// document) resolve against `refs`. References inside an external document
/// resolve relative to that document. Keys next to a `$ref` are kept, with
/// the referenced keys taking precedence.
pub fn resolve_schema_references(schema: Value, refs: &RefStore) -> Result<Value> {
    let root = schema.clone();
    let resolver = SchemaRefResolver::new(&root, refs);
    let mut schema = schema;
    resolver.resolve(&mut schema)?;
    Ok(schema)
}

/// Resolver over one root document and a store of external documents
#[derive(Debug, Clone, Copy)]
pub struct SchemaRefResolver<'a> {
    root: &'a Value,
    store: &'a RefStore,
}

impl<'a> SchemaRefResolver<'a> {
    /// Create a resolver; `root` is the document internal references point into
    pub fn new(root: &'a Value, store: &'a RefStore) -> Self {
        Self { root, store }
    }

    /// Resolve `schema` in place
    pub fn resolve(&self, schema: &mut Value) -> Result<()> {
        let mut chain = Vec::new();
        self.resolve_node(schema, "", &mut chain)
    }

    fn resolve_node(&self, node: &mut Value, base: &str, chain: &mut Vec<String>) -> Result<()> {
        let depth = chain.len();
        let mut base = base.to_string();

        while let Some(reference) = node.as_object_mut().and_then(|obj| obj.remove(REF)) {
            let Value::String(reference) = reference else {
                return Err(Error::invalid_schema(format!(
                    "$ref must be a string, got {reference}"
                )));
            };
            let (doc_name, target) = self.lookup(&reference, &base)?;

            let key = format!("{doc_name}{}", fragment(&reference));
            if chain.contains(&key) {
                return Err(Error::CircularReference { reference });
            }
            chain.push(key);

            merge_resolved(node, target.clone(), &reference)?;
            base = doc_name;
        }

        let base = base.as_str();
        if let Some(obj) = node.as_object_mut() {
            for key in ["properties", "patternProperties"] {
                if let Some(Value::Object(children)) = obj.get_mut(key) {
                    for child in children.values_mut() {
                        self.resolve_node(child, base, chain)?;
                    }
                }
            }

            if let Some(items) = obj.get_mut("items") {
                match *items {
                    Value::Object(_) => self.resolve_node(items, base, chain)?,
                    Value::Array(ref mut tuple) => {
                        for item in tuple {
                            self.resolve_node(item, base, chain)?;
                        }
                    }
                    _ => {}
                }
            }

            if let Some(Value::Array(alternatives)) = obj.get_mut("anyOf") {
                for alternative in alternatives {
                    self.resolve_node(alternative, base, chain)?;
                }
            }
        }

        chain.truncate(depth);
        Ok(())
    }

    /// Find the document and node a reference points at
    fn lookup(&self, reference: &str, base: &str) -> Result<(String, &'a Value)> {
        let (doc_part, pointer) = match reference.split_once('#') {
            Some((doc, pointer)) => (doc, pointer),
            None => (reference, ""),
        };
        let doc_name = if doc_part.is_empty() { base } else { doc_part };

        let document = if doc_name.is_empty() {
            self.root
        } else {
            self.store
                .get(doc_name)
                .ok_or_else(|| Error::unresolvable(reference))?
        };

        let target = if pointer.is_empty() {
            Some(document)
        } else if pointer.starts_with('/') {
            document.pointer(pointer)
        } else {
            None
        };

        target
            .map(|t| (doc_name.to_string(), t))
            .ok_or_else(|| Error::unresolvable(reference))
    }
}

fn fragment(reference: &str) -> &str {
    reference.find('#').map_or("#", |pos| &reference[pos..])
}

fn merge_resolved(node: &mut Value, target: Value, reference: &str) -> Result<()> {
    match (node.as_object_mut(), target) {
        (Some(obj), Value::Object(resolved)) => {
            for (key, value) in resolved {
                obj.insert(key, value);
            }
            Ok(())
        }
        (Some(obj), other) if obj.is_empty() => {
            *node = other;
            Ok(())
        }
        _ => Err(Error::invalid_schema(format!(
            "$ref '{reference}' does not point at a schema object"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_internal_ref_keeps_siblings() {
        let schema = json!({
            "definitions": {"string_type": {"type": "string"}},
            "type": "object",
            "properties": {
                "name": {"$ref": "#/definitions/string_type", "description": "full name"}
            }
        });
        let resolved = resolve_schema_references(schema, &RefStore::new()).unwrap();
        assert_eq!(
            resolved["properties"]["name"],
            json!({"type": "string", "description": "full name"})
        );
    }

    #[test]
    fn test_external_and_indirect_refs() {
        let mut store = RefStore::new();
        store.insert(
            "common.json".to_string(),
            json!({
                "definitions": {
                    "id": {"$ref": "#/definitions/int"},
                    "int": {"type": "integer"}
                }
            }),
        );
        let schema = json!({
            "type": "object",
            "properties": {
                "id": {"$ref": "common.json#/definitions/id"},
                "tags": {"type": "array", "items": {"$ref": "common.json#/definitions/int"}},
                "either": {"anyOf": [{"$ref": "common.json#/definitions/int"}, {"type": "null"}]}
            },
            "patternProperties": {"^x_": {"$ref": "common.json#/definitions/int"}}
        });

        let resolved = resolve_schema_references(schema, &store).unwrap();

        assert_eq!(resolved["properties"]["id"], json!({"type": "integer"}));
        assert_eq!(resolved["properties"]["tags"]["items"], json!({"type": "integer"}));
        assert_eq!(resolved["properties"]["either"]["anyOf"][0], json!({"type": "integer"}));
        assert_eq!(resolved["patternProperties"]["^x_"], json!({"type": "integer"}));
    }

    #[test]
    fn test_whole_document_ref() {
        let mut store = RefStore::new();
        store.insert("ts.json".to_string(), json!({"type": "string", "format": "date-time"}));
        let resolved = resolve_schema_references(json!({"$ref": "ts.json"}), &store).unwrap();
        assert_eq!(resolved, json!({"type": "string", "format": "date-time"}));
    }

    #[test]
    fn test_dangling_ref_is_fatal() {
        let err = resolve_schema_references(
            json!({"properties": {"a": {"$ref": "#/definitions/nope"}}}),
            &RefStore::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnresolvableReference { .. }));

        let err = resolve_schema_references(json!({"$ref": "missing.json#/a"}), &RefStore::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvableReference { .. }));
    }

    #[test]
    fn test_circular_ref_is_rejected() {
        let schema = json!({
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {"child": {"$ref": "#/definitions/node"}}
                }
            },
            "$ref": "#/definitions/node"
        });
        let err = resolve_schema_references(schema, &RefStore::new()).unwrap_err();
        assert!(matches!(err, Error::CircularReference { .. }));
    }

    #[test]
    fn test_repeated_non_circular_refs_are_fine() {
        let schema = json!({
            "definitions": {"s": {"type": "string"}},
            "properties": {
                "a": {"$ref": "#/definitions/s"},
                "b": {"$ref": "#/definitions/s"}
            }
        });
        let resolved = resolve_schema_references(schema, &RefStore::new()).unwrap();
        assert_eq!(resolved["properties"]["a"], resolved["properties"]["b"]);
    }
}
