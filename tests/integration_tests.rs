//! Integration tests through the public API
//!
//! Tests the end-to-end flow: catalog → selection metadata → transform →
//! protocol messages → state checkpoint

use pretty_assertions::assert_eq;
use serde_json::json;
use tapline::metadata::get_standard_metadata;
use tapline::state::diff;
use tapline::transform::{HookError, SchemaMismatch};
use tapline::{
    parse_message, resolve_schema_references, transform, Catalog, CatalogEntry, Error,
    IntegerDatetimeMode, Message, MessageWriter, Metadata, RefStore, Schema, State, Transformer,
};

fn users_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "definitions": {
            "timestamp": {"type": ["null", "string"], "format": "date-time"}
        },
        "properties": {
            "id": {"type": "integer"},
            "name": {"type": ["null", "string"]},
            "balance": {"type": ["null", "string"], "format": "singer.decimal"},
            "created_at": {"$ref": "#/definitions/timestamp"},
            "tags": {"type": "array", "items": {"type": "string"}},
            "address": {"$ref": "common.json#/definitions/address"}
        }
    })
}

fn refs() -> RefStore {
    let mut refs = RefStore::new();
    refs.insert(
        "common.json".to_string(),
        json!({
            "definitions": {
                "address": {
                    "type": ["null", "object"],
                    "properties": {
                        "city": {"type": "string"},
                        "zip": {"$ref": "#/definitions/zip"}
                    }
                },
                "zip": {"type": ["null", "string"]}
            }
        }),
    );
    refs
}

// ============================================================================
// Transform Integration Tests
// ============================================================================

#[test]
fn test_full_record_transform() {
    let schema = resolve_schema_references(users_schema(), &refs()).unwrap();
    let mut transformer = Transformer::new();

    let record = transformer
        .transform(
            json!({
                "id": "42",
                "name": 7,
                "balance": 10.5,
                "created_at": "2024-03-01 12:00:00+01:00",
                "tags": ["a", 1, true],
                "address": {"city": "Oslo", "zip": 150},
                "extra": "dropped"
            }),
            &schema,
            None,
        )
        .unwrap();

    assert_eq!(
        record,
        json!({
            "id": 42,
            "name": "7",
            "balance": "10.5",
            "created_at": "2024-03-01T11:00:00.000000Z",
            "tags": ["a", "1", "true"],
            "address": {"city": "Oslo", "zip": "150"}
        })
    );
    assert!(transformer.removed().contains("extra"));
}

#[test]
fn test_mismatch_reports_every_path() {
    let schema = resolve_schema_references(users_schema(), &refs()).unwrap();
    let err = transform(
        json!({"id": "x", "created_at": "not a date", "tags": [null]}),
        &schema,
        IntegerDatetimeMode::NoIntegerParsing,
        None,
        None,
    )
    .unwrap_err();

    let paths: Vec<String> = err
        .transform_errors()
        .unwrap()
        .iter()
        .map(|e| e.path.to_string())
        .collect();
    for expected in ["id", "created_at", "tags.0", "tags", ""] {
        assert!(paths.contains(&expected.to_string()), "missing {expected:?} in {paths:?}");
    }
    assert!(err.to_string().starts_with("Errors during transform"));
}

#[test]
fn test_unix_milliseconds_mode() {
    let schema = json!({"type": "object", "properties": {"ts": {"type": "string", "format": "date-time"}}});
    let record = transform(
        json!({"ts": 1_700_000_000_123_i64}),
        &schema,
        IntegerDatetimeMode::UnixMilliseconds,
        None,
        None,
    )
    .unwrap();
    assert_eq!(record, json!({"ts": "2023-11-14T22:13:20.123000Z"}));
}

#[test]
fn test_pre_hook_through_free_function() {
    let schema = json!({"type": "object", "properties": {"amount": {"type": "number"}}});
    let strip_currency = |value: &serde_json::Value,
                          candidate: &str,
                          _schema: &serde_json::Value|
     -> Result<serde_json::Value, HookError> {
        match (candidate, value.as_str()) {
            ("number", Some(s)) => Ok(json!(s.trim_start_matches('$'))),
            _ => Ok(value.clone()),
        }
    };
    let record = transform(
        json!({"amount": "$12.5"}),
        &schema,
        IntegerDatetimeMode::NoIntegerParsing,
        Some(&strip_currency),
        None,
    )
    .unwrap();
    assert_eq!(record, json!({"amount": 12.5}));

    let abort = |_: &serde_json::Value,
                 _: &str,
                 _: &serde_json::Value|
     -> Result<serde_json::Value, HookError> { Err(HookError::Abort("stop".to_string())) };
    let err = transform(
        json!({"amount": 1}),
        &schema,
        IntegerDatetimeMode::NoIntegerParsing,
        Some(&abort),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, Error::PreHook { .. }));
}

#[test]
fn test_schema_mismatch_display_without_errors() {
    assert_eq!(
        SchemaMismatch::new(Vec::new()).to_string(),
        "An error occurred during transform that was not a schema mismatch"
    );
}

// ============================================================================
// Catalog + Metadata Integration Tests
// ============================================================================

#[test]
fn test_discovery_to_selected_transform() {
    let resolved = resolve_schema_references(users_schema(), &refs()).unwrap();
    let schema = Schema::from_value(&resolved).unwrap();
    let keys = vec!["id".to_string()];
    let mut metadata = Metadata::from_list(&get_standard_metadata(
        Some(&schema),
        Some("users"),
        Some(keys.as_slice()),
        None,
        None,
    ));

    // operator selection
    metadata.write(&[] as &[&str], "selected", true);
    metadata.write(&["properties", "name"], "selected", false);
    metadata.write(&["properties", "id"], "selected", false);

    let entry = CatalogEntry::new("users", schema)
        .with_key_properties(keys)
        .with_metadata(metadata.to_list());
    let catalog = Catalog::new(vec![entry]);
    let selected = catalog.get_selected_streams(&State::new());
    assert_eq!(selected.len(), 1);

    let stream = selected[0];
    let md = stream.compiled_metadata();
    let mut transformer = Transformer::new();
    let record = transformer
        .transform(
            json!({"id": 1, "name": "Ann", "tags": []}),
            &stream.schema.to_value(),
            Some(&md),
        )
        .unwrap();

    // key properties are automatic, so deselecting them has no effect
    assert_eq!(record, json!({"id": 1, "tags": []}));
    assert!(transformer.filtered().contains("name"));
}

// ============================================================================
// Message + State Integration Tests
// ============================================================================

#[test]
fn test_sync_writes_parseable_stream() {
    let schema = resolve_schema_references(users_schema(), &refs()).unwrap();
    let mut state = State::new();
    let mut writer = MessageWriter::new(Vec::new());
    let mut transformer = Transformer::new();

    writer
        .write_schema("users", schema.clone(), vec!["id".into()], None, None)
        .unwrap();
    for (id, created) in [(1, "2024-01-01"), (2, "2024-01-02")] {
        let record = transformer
            .transform(json!({"id": id, "created_at": created}), &schema, None)
            .unwrap();
        state.set_bookmark("users", "created_at", record["created_at"].clone());
        writer.write_record("users", record, None, None).unwrap();
    }
    state.set_currently_syncing(None);
    writer.write_state(state.to_value()).unwrap();

    let output = String::from_utf8(writer.into_inner()).unwrap();
    let messages: Vec<Message> = output
        .lines()
        .map(|line| parse_message(line).unwrap().unwrap())
        .collect();

    assert_eq!(messages.len(), 4);
    assert!(matches!(&messages[0], Message::Schema { stream, .. } if stream == "users"));
    assert!(messages[1].is_record());
    assert_eq!(
        messages[3],
        Message::state(json!({
            "bookmarks": {"users": {"created_at": "2024-01-02T00:00:00.000000Z"}},
            "currently_syncing": null
        }))
    );
}

#[test]
fn test_state_round_trip_and_diff() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut state = State::new();
    state.set_bookmark("orders", "updated_at", "2024-01-01T00:00:00.000000Z");
    state.set_offset("orders", "page", 3);
    std::fs::write(&path, state.to_value().to_string()).unwrap();

    let loaded = State::from_value(tapline::config::load_json(&path).unwrap()).unwrap();
    assert_eq!(loaded, state);

    let mut next = loaded.clone();
    next.clear_offset("orders");
    let changes: Vec<String> = diff(&loaded.to_value(), &next.to_value())
        .iter()
        .map(|c| c.path().to_string())
        .collect();
    assert_eq!(changes, vec!["bookmarks.orders.offset.page"]);
}
