//! Transform types
//!
//! Datetime parsing modes, per-path errors, the aggregate mismatch error and
//! the pre-hook strategy.

use crate::error::Error;
use crate::types::{DataPath, JsonValue};
use std::fmt;
use std::str::FromStr;

/// Wire name for [`IntegerDatetimeMode::NoIntegerParsing`]
pub const NO_INTEGER_DATETIME_PARSING: &str = "no-integer-datetime-parsing";
/// Wire name for [`IntegerDatetimeMode::UnixSeconds`]
pub const UNIX_SECONDS_INTEGER_DATETIME_PARSING: &str = "unix-seconds-integer-datetime-parsing";
/// Wire name for [`IntegerDatetimeMode::UnixMilliseconds`]
pub const UNIX_MILLISECONDS_INTEGER_DATETIME_PARSING: &str =
    "unix-milliseconds-integer-datetime-parsing";

// ============================================================================
// Integer Datetime Mode
// ============================================================================

/// How numeric values in `date-time` fields are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegerDatetimeMode {
    /// Only strings are parsed
    #[default]
    NoIntegerParsing,
    /// Numbers are Unix timestamps in seconds
    UnixSeconds,
    /// Numbers are Unix timestamps in milliseconds
    UnixMilliseconds,
}

impl IntegerDatetimeMode {
    /// The wire name of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegerDatetimeMode::NoIntegerParsing => NO_INTEGER_DATETIME_PARSING,
            IntegerDatetimeMode::UnixSeconds => UNIX_SECONDS_INTEGER_DATETIME_PARSING,
            IntegerDatetimeMode::UnixMilliseconds => UNIX_MILLISECONDS_INTEGER_DATETIME_PARSING,
        }
    }
}

impl fmt::Display for IntegerDatetimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegerDatetimeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            NO_INTEGER_DATETIME_PARSING => Ok(IntegerDatetimeMode::NoIntegerParsing),
            UNIX_SECONDS_INTEGER_DATETIME_PARSING => Ok(IntegerDatetimeMode::UnixSeconds),
            UNIX_MILLISECONDS_INTEGER_DATETIME_PARSING => {
                Ok(IntegerDatetimeMode::UnixMilliseconds)
            }
            other => Err(Error::invalid_value(
                "integer_datetime_fmt",
                format!("Invalid integer datetime parsing option: {other}"),
            )),
        }
    }
}

// ============================================================================
// Transform Errors
// ============================================================================

/// One location at which data could not be coerced to any candidate type
#[derive(Debug, Clone, PartialEq)]
pub struct TransformError {
    /// Data breadcrumb of the failure
    pub path: DataPath,
    /// The offending value
    pub data: JsonValue,
    /// The schema node; absent when the field was not recognized at all
    pub schema: Option<JsonValue>,
}

impl TransformError {
    /// Create a type mismatch error
    pub fn mismatch(path: DataPath, data: JsonValue, schema: JsonValue) -> Self {
        Self {
            path,
            data,
            schema: Some(schema),
        }
    }

    /// Create a "not in schema" error
    pub fn not_in_schema(path: DataPath, data: JsonValue) -> Self {
        Self {
            path,
            data,
            schema: None,
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}: {} does not match {}", self.path, self.data, schema),
            None => write!(f, "{}: {} not in schema", self.path, self.data),
        }
    }
}

/// Aggregate failure of one `transform` call, carrying every per-path error
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMismatch {
    errors: Vec<TransformError>,
}

impl SchemaMismatch {
    /// Wrap the accumulated errors
    pub fn new(errors: Vec<TransformError>) -> Self {
        Self { errors }
    }

    /// The per-path errors
    pub fn errors(&self) -> &[TransformError] {
        &self.errors
    }

    /// Consume into the per-path errors
    pub fn into_errors(self) -> Vec<TransformError> {
        self.errors
    }
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("An error occurred during transform that was not a schema mismatch");
        }
        f.write_str("Errors during transform")?;
        for error in &self.errors {
            write!(f, "\n\t{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaMismatch {}

// ============================================================================
// Pre-hook
// ============================================================================

/// Failure raised by a [`PreHook`]
#[derive(Debug, Clone, PartialEq)]
pub enum HookError {
    /// The current candidate type fails; the next one is tried
    Reject(String),
    /// The whole transform call fails with [`Error::PreHook`]
    Abort(String),
}

/// Rewrites a raw value before each typed coercion attempt
pub trait PreHook {
    /// Called once per candidate type with the value, the candidate type name
    /// and the schema node being applied
    fn apply(
        &self,
        value: &JsonValue,
        candidate: &str,
        schema: &JsonValue,
    ) -> std::result::Result<JsonValue, HookError>;
}

impl<F> PreHook for F
where
    F: Fn(&JsonValue, &str, &JsonValue) -> std::result::Result<JsonValue, HookError>,
{
    fn apply(
        &self,
        value: &JsonValue,
        candidate: &str,
        schema: &JsonValue,
    ) -> std::result::Result<JsonValue, HookError> {
        self(value, candidate, schema)
    }
}

/// Pre-hook that passes every value through untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl PreHook for NoopHook {
    fn apply(
        &self,
        value: &JsonValue,
        _candidate: &str,
        _schema: &JsonValue,
    ) -> std::result::Result<JsonValue, HookError> {
        Ok(value.clone())
    }
}
