//! Default values for the store configuration.

// Default value functions for serde
pub(crate) fn default_refresh_interval_ms() -> u64 {
    1000
}
pub(crate) fn default_refresh_lead_secs() -> u32 {
    30
}
