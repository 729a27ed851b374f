//! Schema module
//!
//! Provides the JSON Schema object model used by catalogs, and schema
//! generation from sample records.
//!
//! # Features
//!
//! - **Object Model**: typed access to the keywords connectors inspect
//! - **Schema Generation**: observes every value in a set of records
//! - **Nullable Branches**: each observed kind accepts null
//! - **Decimal Numbers**: floating point samples become `singer.decimal` strings

mod generation;
mod types;

pub use generation::generate_schema;
pub use types::{JsonType, JsonTypeOrArray, Schema};
