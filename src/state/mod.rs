//! State management module
//!
//! Handles bookmark tracking between sync runs. State is emitted by taps and
//! handed back on the next run to enable incremental syncs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - the state object with bookmark, offset and version accessors
//! - `paths` / `diff` - leaf-by-leaf comparison of two states

mod diff;
mod types;

pub use diff::{diff, paths, StateChange};
pub use types::State;
