//! Stream catalog
//!
//! The catalog lists the streams a tap can produce, with their schemas and
//! selection metadata. Taps emit it in discovery mode and read it back to
//! decide what to sync.

mod types;

pub use types::{Catalog, CatalogEntry};
