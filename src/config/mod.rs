//! Configuration model for the lock store.
//!
//! This module defines the `StoreConfig` struct, usually embedded in the
//! owning application's YAML configuration. It supports forward-compatible
//! parsing (unknown fields are ignored), defaults for every field, and
//! validation of the refresh timing values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::StoreConfig;
