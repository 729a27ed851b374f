//! The schema-driven transformer
//!
//! Walks a data value and a JSON Schema together, trying each declared type
//! in order (null last) and recording a [`TransformError`] for every node that
//! fits none of them.

use super::coerce;
use super::datetime::to_datetime_string;
use super::filter::FieldFilter;
use super::types::{HookError, IntegerDatetimeMode, PreHook, SchemaMismatch, TransformError};
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::schema::JsonType;
use crate::types::DataPath;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};

/// Coerces data to conform to a JSON Schema.
///
/// Each top-level [`transform`](Transformer::transform) call starts with an
/// empty error list. The `removed` and `filtered` audit sets accumulate over
/// the lifetime of the instance and are logged at debug level when it is
/// dropped. `&mut self` keeps an instance to one call at a time; use one
/// instance per thread when transforming records in parallel.
pub struct Transformer<'h> {
    integer_datetime_fmt: IntegerDatetimeMode,
    pre_hook: Option<Box<dyn PreHook + 'h>>,
    removed: BTreeSet<String>,
    filtered: BTreeSet<String>,
    errors: Vec<TransformError>,
    patterns: HashMap<String, Regex>,
}

impl Default for Transformer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Transformer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("integer_datetime_fmt", &self.integer_datetime_fmt)
            .field("pre_hook", &self.pre_hook.is_some())
            .field("removed", &self.removed)
            .field("filtered", &self.filtered)
            .field("errors", &self.errors)
            .finish()
    }
}

impl<'h> Transformer<'h> {
    /// Create a transformer with no integer datetime parsing and no pre-hook
    pub fn new() -> Self {
        Self {
            integer_datetime_fmt: IntegerDatetimeMode::default(),
            pre_hook: None,
            removed: BTreeSet::new(),
            filtered: BTreeSet::new(),
            errors: Vec::new(),
            patterns: HashMap::new(),
        }
    }

    /// Set how numeric values in `date-time` fields are read
    #[must_use]
    pub fn with_integer_datetime_fmt(mut self, mode: IntegerDatetimeMode) -> Self {
        self.integer_datetime_fmt = mode;
        self
    }

    /// Install a hook run on the raw value before every candidate attempt
    #[must_use]
    pub fn with_pre_hook(mut self, hook: impl PreHook + 'h) -> Self {
        self.pre_hook = Some(Box::new(hook));
        self
    }

    /// The configured integer datetime mode
    pub fn integer_datetime_fmt(&self) -> IntegerDatetimeMode {
        self.integer_datetime_fmt
    }

    /// Dotted paths of fields dropped because the schema does not declare them
    pub fn removed(&self) -> &BTreeSet<String> {
        &self.removed
    }

    /// Dotted paths of fields dropped by selection metadata
    pub fn filtered(&self) -> &BTreeSet<String> {
        &self.filtered
    }

    /// Errors recorded by the most recent `transform` call
    pub fn errors(&self) -> &[TransformError] {
        &self.errors
    }

    /// Log the audit sets at debug level
    pub fn log_warning(&self) {
        if !self.filtered.is_empty() {
            tracing::debug!(
                "Filtered {} paths during transforms as they were unsupported or not selected:\n\t{}",
                self.filtered.len(),
                join(&self.filtered, "\n\t")
            );
            tracing::debug!("Filtered paths list: {:?}", self.filtered);
        }
        if !self.removed.is_empty() {
            tracing::debug!(
                "Removed {} paths during transforms:\n\t{}",
                self.removed.len(),
                join(&self.removed, "\n\t")
            );
            tracing::debug!("Removed paths list: {:?}", self.removed);
        }
    }

    /// Transform `data` against `schema`, pruning fields per `metadata` first.
    ///
    /// Returns the fully coerced value, or [`Error::SchemaMismatch`] carrying
    /// every path that could not be coerced. `schema` must already have its
    /// `$ref`s resolved.
    pub fn transform(
        &mut self,
        data: Value,
        schema: &Value,
        metadata: Option<&Metadata>,
    ) -> Result<Value> {
        self.errors.clear();

        let data = match metadata {
            Some(md) => FieldFilter::new(md).filter(data, &mut self.filtered),
            None => data,
        };

        let mut path = DataPath::root();
        match self.transform_recur(&data, schema, &mut path)? {
            Some(transformed) => Ok(transformed),
            None => Err(SchemaMismatch::new(self.errors.clone()).into()),
        }
    }

    fn transform_recur(
        &mut self,
        data: &Value,
        schema: &Value,
        path: &mut DataPath,
    ) -> Result<Option<Value>> {
        if let Some(alternatives) = schema.get("anyOf") {
            return self.transform_any_of(data, schema, alternatives, path);
        }

        let Some(types) = schema.get("type") else {
            return Ok(Some(data.clone()));
        };

        let mut candidates: Vec<&str> = match types {
            Value::String(name) => vec![name.as_str()],
            Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if let Some(pos) = candidates.iter().position(|t| *t == "null") {
            let null = candidates.remove(pos);
            candidates.push(null);
        }

        let mark = self.errors.len();
        let mut seen = Cow::Borrowed(data);
        for candidate in candidates {
            let Some(input) = self.run_pre_hook(data, candidate, schema)? else {
                continue;
            };
            if let Some(transformed) = self.transform_candidate(&input, candidate, schema, path)? {
                self.errors.truncate(mark);
                return Ok(Some(transformed));
            }
            seen = input;
        }

        self.errors.push(TransformError::mismatch(
            path.clone(),
            seen.into_owned(),
            schema.clone(),
        ));
        Ok(None)
    }

    fn transform_any_of(
        &mut self,
        data: &Value,
        schema: &Value,
        alternatives: &Value,
        path: &mut DataPath,
    ) -> Result<Option<Value>> {
        let Value::Array(alternatives) = alternatives else {
            return Err(Error::invalid_schema(format!(
                "anyOf at '{path}' must be a list of schemas"
            )));
        };

        let mark = self.errors.len();
        for alternative in alternatives {
            let outcome = self.transform_recur(data, alternative, path)?;
            self.errors.truncate(mark);
            if outcome.is_some() {
                return Ok(outcome);
            }
        }

        self.errors.push(TransformError::mismatch(
            path.clone(),
            data.clone(),
            schema.clone(),
        ));
        Ok(None)
    }

    /// `Ok(None)` when the hook rejects this candidate
    fn run_pre_hook<'d>(
        &self,
        data: &'d Value,
        candidate: &str,
        schema: &Value,
    ) -> Result<Option<Cow<'d, Value>>> {
        let Some(hook) = &self.pre_hook else {
            return Ok(Some(Cow::Borrowed(data)));
        };
        match hook.apply(data, candidate, schema) {
            Ok(value) => Ok(Some(Cow::Owned(value))),
            Err(HookError::Reject(reason)) => {
                tracing::trace!("pre-hook rejected '{candidate}': {reason}");
                Ok(None)
            }
            Err(HookError::Abort(message)) => Err(Error::PreHook { message }),
        }
    }

    fn transform_candidate(
        &mut self,
        data: &Value,
        candidate: &str,
        schema: &Value,
        path: &mut DataPath,
    ) -> Result<Option<Value>> {
        let Some(json_type) = JsonType::from_name(candidate) else {
            return Ok(None);
        };

        let format = schema.get("format").and_then(Value::as_str);
        if json_type != JsonType::Null && format == Some("date-time") {
            return Ok(self.transform_datetime(data));
        }

        let result = match json_type {
            JsonType::Null => coerce::to_null(data),
            JsonType::String if format == Some("singer.decimal") => coerce::to_decimal(data),
            JsonType::String => coerce::to_string(data),
            JsonType::Object => return self.transform_object(data, schema, path),
            JsonType::Array => return self.transform_array(data, schema, path),
            JsonType::Integer => coerce::to_integer(data),
            JsonType::Number => coerce::to_number(data),
            JsonType::Boolean => coerce::to_boolean(data),
        };
        Ok(result)
    }

    fn transform_datetime(&self, data: &Value) -> Option<Value> {
        match data {
            Value::Null => Some(Value::Null),
            Value::String(s) if s.is_empty() => Some(Value::Null),
            other => to_datetime_string(other, self.integer_datetime_fmt)
                .ok()
                .map(Value::String),
        }
    }

    fn transform_object(
        &mut self,
        data: &Value,
        schema: &Value,
        path: &mut DataPath,
    ) -> Result<Option<Value>> {
        let Value::Object(map) = data else {
            return Ok(None);
        };

        let empty = Map::new();
        let properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let pattern_properties = schema
            .get("patternProperties")
            .and_then(Value::as_object)
            .filter(|p| !p.is_empty());

        if properties.is_empty() && pattern_properties.is_none() {
            return Ok(Some(data.clone()));
        }

        let mut result = Map::with_capacity(map.len());
        let mut all_succeeded = true;
        for (key, value) in map {
            let pattern_schema;
            let sub_schema = if let Some(sub) = properties.get(key) {
                sub
            } else {
                let matched = self.matching_patterns(key, pattern_properties)?;
                if matched.is_empty() {
                    self.removed.insert(path.child(key.as_str()).to_string());
                    continue;
                }
                pattern_schema = json!({ "anyOf": matched });
                &pattern_schema
            };

            path.push(key.as_str());
            let outcome = self.transform_recur(value, sub_schema, path)?;
            path.pop();

            match outcome {
                Some(transformed) => {
                    result.insert(key.clone(), transformed);
                }
                None => {
                    all_succeeded = false;
                    result.insert(key.clone(), Value::Null);
                }
            }
        }

        Ok(all_succeeded.then_some(Value::Object(result)))
    }

    fn transform_array(
        &mut self,
        data: &Value,
        schema: &Value,
        path: &mut DataPath,
    ) -> Result<Option<Value>> {
        let Value::Array(items) = data else {
            return Ok(None);
        };
        let Some(item_schema) = schema.get("items").filter(|s| s.is_object()) else {
            return Ok(Some(data.clone()));
        };

        let mut result = Vec::with_capacity(items.len());
        let mut all_succeeded = true;
        for (i, item) in items.iter().enumerate() {
            path.push(i);
            let outcome = self.transform_recur(item, item_schema, path)?;
            path.pop();

            all_succeeded &= outcome.is_some();
            result.push(outcome.unwrap_or(Value::Null));
        }

        Ok(all_succeeded.then_some(Value::Array(result)))
    }

    /// Sub-schemas whose pattern matches `key` at its start
    fn matching_patterns(
        &mut self,
        key: &str,
        pattern_properties: Option<&Map<String, Value>>,
    ) -> Result<Vec<Value>> {
        let Some(patterns) = pattern_properties else {
            return Ok(Vec::new());
        };

        let mut matched = Vec::new();
        for (pattern, sub_schema) in patterns {
            if !self.patterns.contains_key(pattern) {
                let compiled = Regex::new(&format!("^(?:{pattern})"))?;
                self.patterns.insert(pattern.clone(), compiled);
            }
            if self.patterns[pattern].is_match(key) {
                matched.push(sub_schema.clone());
            }
        }
        Ok(matched)
    }
}

impl Drop for Transformer<'_> {
    fn drop(&mut self) {
        self.log_warning();
    }
}

fn join(paths: &BTreeSet<String>, sep: &str) -> String {
    paths.iter().map(String::as_str).collect::<Vec<_>>().join(sep)
}

/// Transform `data` against `schema` with a one-shot [`Transformer`]
pub fn transform(
    data: Value,
    schema: &Value,
    integer_datetime_fmt: IntegerDatetimeMode,
    pre_hook: Option<&dyn PreHook>,
    metadata: Option<&Metadata>,
) -> Result<Value> {
    let mut transformer = Transformer::new().with_integer_datetime_fmt(integer_datetime_fmt);
    if let Some(hook) = pre_hook {
        transformer = transformer.with_pre_hook(BorrowedHook(hook));
    }
    transformer.transform(data, schema, metadata)
}

struct BorrowedHook<'a>(&'a dyn PreHook);

impl PreHook for BorrowedHook<'_> {
    fn apply(
        &self,
        value: &Value,
        candidate: &str,
        schema: &Value,
    ) -> std::result::Result<Value, HookError> {
        self.0.apply(value, candidate, schema)
    }
}
