//! Transformer tests

use super::*;
use crate::error::Error;
use crate::metadata::{Metadata, MetadataEntry};
use crate::types::{DataPath, PathSegment};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn run(data: Value, schema: Value) -> crate::Result<Value> {
    Transformer::new().transform(data, &schema, None)
}

fn metadata(entries: Value) -> Metadata {
    let entries: Vec<MetadataEntry> = serde_json::from_value(entries).unwrap();
    Metadata::from_list(&entries)
}

fn error_paths(err: &Error) -> Vec<DataPath> {
    let mut paths: Vec<DataPath> = err
        .transform_errors()
        .expect("schema mismatch")
        .iter()
        .map(|e| e.path.clone())
        .collect();
    paths.sort();
    paths
}

fn path(keys: &[&str]) -> DataPath {
    keys.iter()
        .map(|k| PathSegment::from(*k))
        .collect::<Vec<_>>()
        .into()
}

// ============================================================================
// Candidate types
// ============================================================================

#[test]
fn test_null_is_tried_last() {
    let schema = json!({"type": ["null", "string"]});
    assert_eq!(run(json!(""), schema.clone()).unwrap(), json!(""));
    assert_eq!(run(json!(null), schema).unwrap(), json!(null));
}

#[test]
fn test_null_alone_accepts_empty_string() {
    assert_eq!(run(json!(""), json!({"type": "null"})).unwrap(), json!(null));
    assert!(run(json!("x"), json!({"type": "null"})).is_err());
}

#[test_case(json!("1,234"), json!({"type": "integer"}), json!(1234) ; "comma integer")]
#[test_case(json!("12"), json!({"type": ["null", "integer"]}), json!(12) ; "nullable integer")]
#[test_case(json!("1,000.5"), json!({"type": "number"}), json!(1000.5) ; "comma number")]
#[test_case(json!("false"), json!({"type": "boolean"}), json!(false) ; "false string")]
#[test_case(json!("False"), json!({"type": "boolean"}), json!(false) ; "capitalized false string")]
#[test_case(json!("yes"), json!({"type": "boolean"}), json!(true) ; "truthy string")]
#[test_case(json!(42), json!({"type": "string"}), json!("42") ; "number to string")]
#[test_case(json!(true), json!({"type": "string"}), json!("true") ; "bool to string")]
#[test_case(json!("abc"), json!({"type": ["integer", "string"]}), json!("abc") ; "falls through to string")]
#[test_case(json!({"a": 1}), json!({}), json!({"a": 1}) ; "untyped passes through")]
fn test_coercions(data: Value, schema: Value, expected: Value) {
    assert_eq!(run(data, schema).unwrap(), expected);
}

#[test]
fn test_unknown_type_name_fails() {
    let err = run(json!("x"), json!({"type": "uuid"})).unwrap_err();
    assert_eq!(error_paths(&err), vec![DataPath::root()]);
}

#[test]
fn test_decimal_format() {
    let schema = json!({"type": ["null", "string"], "format": "singer.decimal"});
    assert_eq!(run(json!(1.10), schema.clone()).unwrap(), json!("1.1"));
    assert_eq!(run(json!("1.10"), schema.clone()).unwrap(), json!("1.10"));
    assert_eq!(run(json!("nan"), schema.clone()).unwrap(), json!("NaN"));
    assert_eq!(run(json!(null), schema.clone()).unwrap(), json!(null));
    assert!(run(json!("abc"), schema).is_err());
}

// ============================================================================
// Date-times
// ============================================================================

#[test]
fn test_datetime_is_canonicalized() {
    let schema = json!({"type": "string", "format": "date-time"});
    assert_eq!(
        run(json!("2017-01-01T02:00:00+02:00"), schema).unwrap(),
        json!("2017-01-01T00:00:00.000000Z")
    );
}

#[test]
fn test_datetime_empty_and_null_are_absent() {
    let schema = json!({"type": "string", "format": "date-time"});
    assert_eq!(run(json!(""), schema.clone()).unwrap(), json!(null));
    assert_eq!(run(json!(null), schema).unwrap(), json!(null));
}

#[test]
fn test_datetime_garbage_is_recorded() {
    let schema = json!({
        "type": "object",
        "properties": {"at": {"type": ["null", "string"], "format": "date-time"}}
    });
    let err = run(json!({"at": "cat"}), schema).unwrap_err();
    assert_eq!(error_paths(&err), vec![DataPath::root(), path(&["at"])]);
}

#[test]
fn test_datetime_integer_modes() {
    let schema = json!({"type": ["null", "string"], "format": "date-time"});

    let mut seconds =
        Transformer::new().with_integer_datetime_fmt(IntegerDatetimeMode::UnixSeconds);
    assert_eq!(
        seconds.transform(json!(86400), &schema, None).unwrap(),
        json!("1970-01-02T00:00:00.000000Z")
    );

    let mut millis =
        Transformer::new().with_integer_datetime_fmt(IntegerDatetimeMode::UnixMilliseconds);
    assert_eq!(
        millis.transform(json!(86400), &schema, None).unwrap(),
        json!("1970-01-01T00:01:26.400000Z")
    );

    assert!(Transformer::new().transform(json!(86400), &schema, None).is_err());
}

#[test]
fn test_integer_datetime_mode_wire_names() {
    for mode in [
        IntegerDatetimeMode::NoIntegerParsing,
        IntegerDatetimeMode::UnixSeconds,
        IntegerDatetimeMode::UnixMilliseconds,
    ] {
        assert_eq!(mode.to_string().parse::<IntegerDatetimeMode>().unwrap(), mode);
    }
    let err = "unix-hours".parse::<IntegerDatetimeMode>().unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}

// ============================================================================
// anyOf
// ============================================================================

#[test]
fn test_any_of_first_match_wins() {
    let schema = json!({"anyOf": [{"type": "null"}, {"type": "string", "format": "date-time"}]});
    assert_eq!(run(json!(null), schema.clone()).unwrap(), json!(null));
    assert_eq!(
        run(json!("2017-01-01"), schema).unwrap(),
        json!("2017-01-01T00:00:00.000000Z")
    );
}

#[test]
fn test_any_of_all_fail_records_one_error() {
    let schema = json!({"anyOf": [{"type": "integer"}, {"type": "null"}]});
    let err = run(json!("x"), schema.clone()).unwrap_err();
    let errors = err.transform_errors().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, DataPath::root());
    assert_eq!(errors[0].schema.as_ref(), Some(&schema));
}

#[test]
fn test_any_of_discards_errors_from_failed_branches() {
    let schema = json!({"anyOf": [
        {"type": "object", "properties": {"a": {"type": "integer"}}},
        {"type": "object", "properties": {"a": {"type": "string"}}}
    ]});
    let mut transformer = Transformer::new();
    assert_eq!(
        transformer.transform(json!({"a": "x"}), &schema, None).unwrap(),
        json!({"a": "x"})
    );
    assert!(transformer.errors().is_empty());
}

#[test]
fn test_any_of_must_be_a_list() {
    let err = run(json!(1), json!({"anyOf": {"type": "integer"}})).unwrap_err();
    assert!(matches!(err, Error::InvalidSchema { .. }));
}

// ============================================================================
// Objects and arrays
// ============================================================================

#[test]
fn test_unexpected_field_is_removed() {
    let schema = json!({"type": "object", "properties": {"good_property": {"type": "string"}}});
    let mut transformer = Transformer::new();
    let out = transformer
        .transform(json!({"good_property": "x", "bad_property": "y"}), &schema, None)
        .unwrap();

    assert_eq!(out, json!({"good_property": "x"}));
    assert!(transformer.removed().contains("bad_property"));
    assert!(transformer.errors().is_empty());
}

#[test]
fn test_nested_removed_paths_are_dotted() {
    let schema = json!({
        "type": "object",
        "properties": {"addr": {"type": "object", "properties": {"city": {"type": "string"}}}}
    });
    let mut transformer = Transformer::new();
    transformer
        .transform(json!({"addr": {"city": "x", "zip": "1"}}), &schema, None)
        .unwrap();
    assert!(transformer.removed().contains("addr.zip"));
}

#[test]
fn test_object_without_properties_is_identity() {
    let data = json!({"anything": [1, {"b": null}]});
    assert_eq!(run(data.clone(), json!({"type": "object"})).unwrap(), data);
    assert_eq!(
        run(data.clone(), json!({"type": "object", "properties": {}})).unwrap(),
        data
    );
}

#[test]
fn test_non_object_falls_through_to_string() {
    let schema = json!({"type": ["null", "object", "string"], "properties": {"a": {"type": "integer"}}});
    assert_eq!(run(json!(5), schema.clone()).unwrap(), json!("5"));
    assert_eq!(run(json!({"a": "7"}), schema).unwrap(), json!({"a": 7}));
}

#[test]
fn test_nested_error_paths_are_complete() {
    let schema = json!({
        "type": "object",
        "properties": {"key1": {"type": "object", "properties": {
            "key2": {"type": "object", "properties": {
                "key3": {"type": "object", "properties": {
                    "key4": {"type": "integer"}
                }}
            }}
        }}}
    });
    let data = json!({"key1": {"key2": {"key3": {"key4": "not an integer"}}}});

    let err = run(data, schema).unwrap_err();

    assert_eq!(
        error_paths(&err),
        vec![
            DataPath::root(),
            path(&["key1"]),
            path(&["key1", "key2"]),
            path(&["key1", "key2", "key3"]),
            path(&["key1", "key2", "key3", "key4"]),
        ]
    );
    assert!(err
        .to_string()
        .contains(r#"key1.key2.key3.key4: "not an integer" does not match {"type":"integer"}"#));
}

#[test]
fn test_all_failing_fields_are_reported() {
    let schema = json!({
        "type": "object",
        "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}, "c": {"type": "integer"}}
    });
    let err = run(json!({"a": "x", "b": 2, "c": "y"}), schema).unwrap_err();
    assert_eq!(
        error_paths(&err),
        vec![DataPath::root(), path(&["a"]), path(&["c"])]
    );
}

#[test]
fn test_array_items_are_indexed() {
    let schema = json!({"type": "array", "items": {"type": "integer"}});
    assert_eq!(run(json!(["1", 2, "3,000"]), schema.clone()).unwrap(), json!([1, 2, 3000]));

    let err = run(json!([1, "x"]), schema).unwrap_err();
    assert_eq!(
        error_paths(&err),
        vec![DataPath::root(), DataPath::from(vec![PathSegment::Index(1)])]
    );
    assert_eq!(err.transform_errors().unwrap()[0].to_string(), r#"1: "x" does not match {"type":"integer"}"#);
}

#[test]
fn test_array_without_items_passes_through() {
    let data = json!([1, "a", null]);
    assert_eq!(run(data.clone(), json!({"type": "array"})).unwrap(), data);
    assert!(run(json!("a"), json!({"type": "array"})).is_err());
}

#[test]
fn test_pattern_properties() {
    let schema = json!({
        "type": "object",
        "properties": {"id": {"type": "string"}},
        "patternProperties": {"x_": {"type": "integer"}, "[0-9]+": {"type": "boolean"}}
    });
    let mut transformer = Transformer::new();
    let out = transformer
        .transform(
            json!({"id": 1, "x_count": "5", "12": "false", "ax_": "1"}),
            &schema,
            None,
        )
        .unwrap();

    assert_eq!(out, json!({"id": "1", "x_count": 5, "12": false}));
    assert!(transformer.removed().contains("ax_"));
}

#[test]
fn test_overlapping_patterns_act_as_any_of() {
    let schema = json!({
        "type": "object",
        "patternProperties": {"a": {"type": "integer"}, "ab": {"type": "string"}}
    });
    assert_eq!(run(json!({"abc": "word"}), schema).unwrap(), json!({"abc": "word"}));
}

#[test]
fn test_invalid_pattern_is_fatal() {
    let schema = json!({"type": "object", "patternProperties": {"(": {"type": "string"}}});
    let err = run(json!({"a": "b"}), schema).unwrap_err();
    assert!(matches!(err, Error::InvalidPattern(_)));
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_unselected_field_is_dropped() {
    let schema = json!({"type": "object", "properties": {"name": {"type": "string"}}});
    let md = metadata(json!([
        {"breadcrumb": ["properties", "name"], "metadata": {"selected": false}}
    ]));
    let mut transformer = Transformer::new();
    let out = transformer
        .transform(json!({"name": "chicken"}), &schema, Some(&md))
        .unwrap();

    assert_eq!(out, json!({}));
    assert!(transformer.filtered().contains("name"));
}

#[test]
fn test_automatic_field_is_kept() {
    let schema = json!({"type": "object", "properties": {"name": {"type": "string"}}});
    let md = metadata(json!([
        {"breadcrumb": ["properties", "name"], "metadata": {"inclusion": "automatic"}}
    ]));
    assert_eq!(
        Transformer::new()
            .transform(json!({"name": "chicken"}), &schema, Some(&md))
            .unwrap(),
        json!({"name": "chicken"})
    );
}

#[test]
fn test_unsupported_field_is_dropped() {
    let schema = json!({"type": "object", "properties": {"blob": {"type": "string"}, "id": {"type": "integer"}}});
    let md = metadata(json!([
        {"breadcrumb": ["properties", "blob"], "metadata": {"inclusion": "unsupported"}}
    ]));
    assert_eq!(
        transform(
            json!({"blob": "x", "id": "3"}),
            &schema,
            IntegerDatetimeMode::NoIntegerParsing,
            None,
            Some(&md)
        )
        .unwrap(),
        json!({"id": 3})
    );
}

// ============================================================================
// Pre-hook
// ============================================================================

#[test]
fn test_pre_hook_rewrites_each_attempt() {
    let schema = json!({"type": "object", "properties": {"n": {"type": ["integer", "string"]}}});
    let hook = |value: &Value, candidate: &str, _schema: &Value| -> std::result::Result<Value, HookError> {
        match (candidate, value) {
            ("integer", Value::String(s)) => Ok(json!(s.trim_start_matches('#'))),
            _ => Ok(value.clone()),
        }
    };
    let mut transformer = Transformer::new().with_pre_hook(hook);
    assert_eq!(
        transformer.transform(json!({"n": "#12"}), &schema, None).unwrap(),
        json!({"n": 12})
    );
    assert_eq!(
        transformer.transform(json!({"n": "#ab"}), &schema, None).unwrap(),
        json!({"n": "#ab"})
    );
}

#[test]
fn test_pre_hook_reject_skips_candidate() {
    let schema = json!({"type": ["integer", "string"]});
    let hook = |value: &Value, candidate: &str, _schema: &Value| -> std::result::Result<Value, HookError> {
        if candidate == "integer" {
            Err(HookError::Reject("no integers".to_string()))
        } else {
            Ok(value.clone())
        }
    };
    let out = transform(
        json!("5"),
        &schema,
        IntegerDatetimeMode::NoIntegerParsing,
        Some(&hook),
        None,
    )
    .unwrap();
    assert_eq!(out, json!("5"));
}

#[test]
fn test_pre_hook_abort_is_fatal() {
    let hook = |_: &Value, _: &str, _: &Value| -> std::result::Result<Value, HookError> {
        Err(HookError::Abort("bad record".to_string()))
    };
    let mut transformer = Transformer::new().with_pre_hook(hook);
    let err = transformer
        .transform(json!("x"), &json!({"type": "string"}), None)
        .unwrap_err();
    assert!(matches!(err, Error::PreHook { .. }));
}

#[test]
fn test_noop_hook_changes_nothing() {
    let schema = json!({"type": "integer"});
    let mut transformer = Transformer::new().with_pre_hook(NoopHook);
    assert_eq!(transformer.transform(json!("7"), &schema, None).unwrap(), json!(7));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_errors_reset_between_calls() {
    let schema = json!({"type": "integer"});
    let mut transformer = Transformer::new();
    assert!(transformer.transform(json!("x"), &schema, None).is_err());
    assert_eq!(transformer.errors().len(), 1);

    assert_eq!(transformer.transform(json!("1"), &schema, None).unwrap(), json!(1));
    assert!(transformer.errors().is_empty());
}

#[test]
fn test_resolved_schema_transforms() {
    let schema = json!({
        "definitions": {"string_type": {"type": "string"}},
        "type": "object",
        "properties": {"name": {"$ref": "#/definitions/string_type", "maxLength": 5}}
    });
    let resolved = resolve_schema_references(schema, &RefStore::new()).unwrap();
    assert_eq!(resolved["properties"]["name"]["type"], json!("string"));
    assert_eq!(resolved["properties"]["name"]["maxLength"], json!(5));
    assert_eq!(run(json!({"name": 1}), resolved).unwrap(), json!({"name": "1"}));
}
