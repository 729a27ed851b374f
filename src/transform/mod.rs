//! Schema-driven record transformation
//!
//! Coerces loosely typed source records into values that conform to a stream's
//! JSON Schema, after pruning fields per the stream's selection metadata.
//!
//! # Features
//!
//! - **Candidate Types**: `type` lists are tried in order, with `null` last
//! - **anyOf**: first matching alternative wins
//! - **patternProperties**: keys matched at their start, multiple matches act as `anyOf`
//! - **Date-times**: canonical UTC rendering, optional Unix timestamp parsing
//! - **`$ref` Resolution**: internal and external references inlined up front
//! - **Error Reporting**: every failing path collected into one [`SchemaMismatch`]

mod coerce;
mod datetime;
mod filter;
mod refs;
mod transformer;
mod types;

pub use datetime::{now, strftime, strptime_to_utc, to_datetime_string, DATETIME_FMT};
pub use filter::{breadcrumb_path, FieldFilter};
pub use refs::{resolve_schema_references, RefStore, SchemaRefResolver};
pub use transformer::{transform, Transformer};
pub use types::{
    HookError, IntegerDatetimeMode, NoopHook, PreHook, SchemaMismatch, TransformError,
    NO_INTEGER_DATETIME_PARSING, UNIX_MILLISECONDS_INTEGER_DATETIME_PARSING,
    UNIX_SECONDS_INTEGER_DATETIME_PARSING,
};

#[cfg(test)]
mod tests;
