//! Error types for leasekeeper.
//!
//! Uses thiserror for derive macros. Lease operations themselves never fail;
//! errors only come from configuration handling and diagnostics output.

use thiserror::Error;

/// Main error type for leasekeeper operations.
#[derive(Error, Debug)]
pub enum LeaseKeeperError {
    /// Configuration could not be read, parsed, or failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A diagnostics snapshot could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Result type alias for leasekeeper operations.
pub type Result<T> = std::result::Result<T, LeaseKeeperError>;
