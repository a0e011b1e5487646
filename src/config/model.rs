//! StoreConfig struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Timing configuration for a [`crate::locks::LockStore`].
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Milliseconds between two refresh passes of the ticker.
    ///
    /// Must be materially smaller than the shortest lease the server grants,
    /// otherwise a lease can expire between two passes.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// A lease whose deadline falls within this many seconds of now is
    /// refreshed on the next pass.
    #[serde(default = "default_refresh_lead_secs")]
    pub refresh_lead_secs: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            refresh_lead_secs: default_refresh_lead_secs(),
        }
    }
}
