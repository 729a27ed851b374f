// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]

//! # tapline
//!
//! Support library for taps and targets that exchange line-delimited JSON
//! messages.
//!
//! ## Features
//!
//! - **Schema-driven transform**: Coerce records to their JSON Schema, with
//!   `$ref` inlining, `anyOf`, `patternProperties` and date-time normalization
//! - **Field selection**: Drop fields by catalog metadata before coercion
//! - **Messages**: Parse and write `RECORD`, `SCHEMA`, `STATE` and
//!   `ACTIVATE_VERSION` lines
//! - **Catalog & State**: Stream selection, bookmarks and state diffs
//! - **Metrics**: Counters and timers logged as structured lines
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serde_json::json;
//! use tapline::{resolve_schema_references, RefStore, Transformer};
//!
//! let schema = resolve_schema_references(
//!     json!({"type": "object", "properties": {"id": {"type": "integer"}}}),
//!     &RefStore::new(),
//! )?;
//! let mut transformer = Transformer::new();
//! let record = transformer.transform(json!({"id": "42"}), &schema, None)?;
//! assert_eq!(record, json!({"id": 42}));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Transformer                            │
//! │  FieldFilter → type candidates → anyOf / objects / arrays       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Messages │  Catalog  │   Metadata    │   State   │   Metrics   │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Parse    │ Selection │ Breadcrumbs   │ Bookmarks │ Counters    │
//! │ Write    │ Dump/Load │ Inclusion     │ Diff      │ Timers      │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Logging setup
pub mod logger;

/// Config, state and catalog file loading
pub mod config;

/// Line-delimited message protocol
pub mod messages;

/// JSON Schema model and generation
pub mod schema;

/// Breadcrumb-keyed stream metadata
pub mod metadata;

/// Stream catalog
pub mod catalog;

/// Bookmarks and state diffing
pub mod state;

/// Schema-driven record transformation
pub mod transform;

/// Structured metric logging
pub mod metrics;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogEntry};
pub use messages::{parse_message, Message, MessageWriter};
pub use metadata::{Inclusion, Metadata};
pub use schema::Schema;
pub use state::State;
pub use transform::{
    resolve_schema_references, transform, IntegerDatetimeMode, PreHook, RefStore, Transformer,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
